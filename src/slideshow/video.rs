use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::decode::VideoClip;

/// Outcome of one frame tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// Render the frame at this index and come back after the frame delay.
    Render(usize),
    /// Looped long enough; hand control back to the timeline.
    Finished,
    /// Nothing to play.
    Empty,
}

/// Looping playback state of the current clip.
#[derive(Debug, Default)]
pub struct VideoPlayback {
    frames: Vec<RgbaImage>,
    // -1 until the first frame is shown.
    frame_index: i64,
    frame_delay: Duration,
    started_at: Option<Instant>,
}

/// `round(1000 / fps * speedup)` milliseconds, never below 1 ms.
pub fn frame_delay_for(fps: f64, speedup: f64) -> Duration {
    let ms = (1000.0 / fps * speedup).round();
    let ms = if ms.is_finite() { ms.max(1.0) } else { 1.0 };
    Duration::from_millis(ms as u64)
}

impl VideoPlayback {
    pub fn new() -> Self {
        Self {
            frame_index: -1,
            ..Self::default()
        }
    }

    pub fn start(&mut self, clip: VideoClip, speedup: f64, now: Instant) {
        self.frame_delay = frame_delay_for(clip.fps, speedup);
        self.frames = clip.frames;
        self.frame_index = -1;
        self.started_at = Some(now);
    }

    /// Release the frames and forget the position.
    pub fn reset(&mut self) {
        self.frames = Vec::new();
        self.frame_index = -1;
        self.frame_delay = Duration::ZERO;
        self.started_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_index(&self) -> i64 {
        self.frame_index
    }

    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    pub fn frame(&self, index: usize) -> Option<&RgbaImage> {
        self.frames.get(index)
    }

    /// Move to the next frame.
    ///
    /// A clip only finishes once a full pass has been shown and `dwell` has
    /// elapsed since playback began; while `paused` it loops forever.
    pub fn step(&mut self, paused: bool, dwell: Duration, now: Instant) -> FrameStep {
        let count = self.frames.len() as i64;
        if count == 0 {
            return FrameStep::Empty;
        }

        self.frame_index += 1;
        let elapsed = self
            .started_at
            .map_or(Duration::ZERO, |at| now.saturating_duration_since(at));
        if !paused && self.frame_index >= count && elapsed > dwell {
            return FrameStep::Finished;
        }
        if self.frame_index < 0 || self.frame_index >= count {
            self.frame_index = 0;
        }
        FrameStep::Render(self.frame_index as usize)
    }
}
