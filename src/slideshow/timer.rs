//! Single-shot timers delivered back to the slideshow as [`Tick`]s.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Longest delay honoured; anything beyond is clamped so deadlines never overflow.
pub const MAX_DELAY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// What a fired timer asks the slideshow to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Dwell time elapsed; move on to the next item.
    Advance,
    /// Show the next frame of the playing clip.
    VideoFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, tick: Tick) -> TimerHandle;
    /// Idempotent; cancelling a handle that already fired is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Deadline-ordered timer set driven by an external clock.
///
/// The owner reports the time with [`TimerQueue::set_now`] (or implicitly via
/// [`TimerQueue::pop_due`]) so the same queue serves the tokio event loop and
/// tests running on a virtual clock.
#[derive(Debug)]
pub struct TimerQueue {
    now: Instant,
    next_id: u64,
    // Keyed by (deadline, id) so equal deadlines fire in arming order.
    pending: BTreeMap<(Instant, u64), Tick>,
}

impl TimerQueue {
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Time only moves forward.
    pub fn set_now(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(at, _)| *at)
    }

    /// Remove and return the earliest timer due at `now`, if any.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerHandle, Tick)> {
        self.set_now(now);
        let (&(at, id), _) = self.pending.iter().next()?;
        if at > self.now {
            return None;
        }
        self.pending
            .remove(&(at, id))
            .map(|tick| (TimerHandle(id), tick))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration, tick: Tick) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let at = self
            .now
            .checked_add(delay.min(MAX_DELAY))
            .or_else(|| self.now.checked_add(Duration::from_secs(24 * 60 * 60)))
            .unwrap_or(self.now);
        self.pending.insert((at, id), tick);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|&(_, id), _| id != handle.0);
    }
}
