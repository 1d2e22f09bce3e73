//! Playback timeline: which item is on screen, when it moves on, and how
//! pause, manual navigation and zoom interact with the pending timer.
//!
//! The engine is single-threaded. Every entry point is called serially by the
//! owner (the player task, or a test) with the current [`Instant`]; timers are
//! armed through a [`Scheduler`] and come back through [`Slideshow::on_timer`].

pub mod timer;
pub mod video;
pub mod zoom;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use image::RgbaImage;
use tracing::{debug, info, trace, warn};

use crate::config::{ClockOptions, Configuration};
use crate::decode::MediaDecoder;
use crate::display::DisplaySink;
use crate::media::{MediaKind, is_recent};
use crate::processing::resize::resize_rgba;

use timer::{Scheduler, Tick, TimerHandle};
use video::{FrameStep, VideoPlayback};
use zoom::{Direction, Zoom, ZoomAction};

pub const NO_MEDIA_LABEL: &str = "No photo";

/// What asked the timeline to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Timer driven; suppressed while paused.
    Auto,
    Restart,
    Prev,
    Next,
}

impl Trigger {
    pub fn is_explicit(self) -> bool {
        !matches!(self, Trigger::Auto)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ShowingImage,
    ShowingVideo,
}

#[derive(Debug, Clone)]
pub struct SlideshowOptions {
    pub interval: Duration,
    pub new_media_window: Duration,
    pub clock: ClockOptions,
    pub speedup_factor: f64,
    pub navigation_step_px: i64,
}

impl From<&Configuration> for SlideshowOptions {
    fn from(cfg: &Configuration) -> Self {
        Self {
            interval: cfg.slideshow_interval,
            new_media_window: cfg.new_media_window,
            clock: cfg.clock.clone(),
            speedup_factor: cfg.video.speedup_factor,
            navigation_step_px: cfg.zoom.navigation_step_px,
        }
    }
}

/// Index the timeline lands on for `trigger`, given where the current item
/// sits in a list of `len` entries (`None` when unset or no longer listed).
pub fn select_index(trigger: Trigger, current: Option<usize>, len: usize) -> usize {
    debug_assert!(len > 0);
    let cur = current.map_or(-1, |i| i as i64);
    let len = len as i64;
    let next = match trigger {
        Trigger::Restart => 0,
        Trigger::Prev => {
            let i = cur - 1;
            if i < 0 { len - 1 } else { i }
        }
        Trigger::Next | Trigger::Auto => {
            let i = cur + 1;
            if i >= len { 0 } else { i }
        }
    };
    next as usize
}

pub struct Slideshow<D, S, T> {
    decoder: D,
    sink: S,
    timers: T,
    options: SlideshowOptions,

    media: Vec<PathBuf>,
    current_index: Option<usize>,
    current_item: Option<PathBuf>,
    paused: bool,
    pending: Option<TimerHandle>,
    phase: Phase,

    // Last still raster handed to the sink; source for zoom on pause.
    displayed: Option<RgbaImage>,
    video: VideoPlayback,
    zoom: Zoom,
    empty_video_skips: usize,
}

impl<D, S, T> Slideshow<D, S, T>
where
    D: MediaDecoder,
    S: DisplaySink,
    T: Scheduler,
{
    pub fn new(decoder: D, sink: S, timers: T, options: SlideshowOptions) -> Self {
        let zoom = Zoom::new(options.navigation_step_px);
        Self {
            decoder,
            sink,
            timers,
            options,
            media: Vec::new(),
            current_index: None,
            current_item: None,
            paused: false,
            pending: None,
            phase: Phase::Idle,
            displayed: None,
            video: VideoPlayback::new(),
            zoom,
            empty_video_skips: 0,
        }
    }

    /// Build with an initial list without showing anything yet.
    pub fn with_media(mut self, media: Vec<PathBuf>) -> Self {
        self.media = media;
        self
    }

    pub fn media(&self) -> &[PathBuf] {
        &self.media
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_item(&self) -> Option<&Path> {
        self.current_item.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.pending
    }

    pub fn zoom(&self) -> &Zoom {
        &self.zoom
    }

    pub fn video(&self) -> &VideoPlayback {
        &self.video
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    pub fn advance(&mut self, trigger: Trigger, now: Instant) {
        self.refresh_clock();

        if trigger.is_explicit() {
            self.cancel_pending();
        }

        // An empty list stops the show even while paused; nothing is re-armed.
        if self.media.is_empty() {
            info!(?trigger, "no media to show");
            self.cancel_pending();
            self.zoom.reset();
            self.video.reset();
            self.sink.show_placeholder(NO_MEDIA_LABEL);
            self.sink.set_highlight(false);
            self.displayed = None;
            self.phase = Phase::Idle;
            return;
        }

        if self.paused && trigger == Trigger::Auto {
            trace!("auto-advance suppressed while paused");
            // Keep ticking so the clock stays fresh and the show resumes on schedule.
            self.arm(self.options.interval, Tick::Advance);
            return;
        }

        // Zoom survives until the next item actually decodes.
        self.video.reset();

        let position = self.position_of_current();
        let index = select_index(trigger, position, self.media.len());
        let item = self.media[index].clone();
        self.current_index = Some(index);
        self.current_item = Some(item.clone());
        debug!(?trigger, index, path = %item.display(), "advance");

        match MediaKind::of(&item) {
            Some(MediaKind::Video) => self.show_video(&item, now),
            _ => self.show_image(&item),
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.sink.set_paused(self.paused);
        if self.paused {
            info!("paused");
            if self.phase == Phase::ShowingImage {
                if let Some(raster) = &self.displayed {
                    self.zoom.init(raster.clone());
                }
            }
        } else {
            info!("resumed");
            self.zoom.reset();
        }
    }

    /// Magnify or pan the paused still; no-op unless zoom has a raster.
    pub fn apply_zoom(&mut self, action: Option<ZoomAction>, direction: Option<Direction>) {
        let cropped = self.zoom.set_zoom(action, direction);
        if cropped.width() == 0 || cropped.height() == 0 {
            info!("not cropped: nothing to zoom into");
            return;
        }
        match resize_rgba(&cropped, self.zoom.width(), self.zoom.height()) {
            Ok(view) => self.sink.render(&view),
            Err(err) => warn!("zoomed view not rendered: {err:#}"),
        }
    }

    /// Adopt a fresh listing. The item on screen stays; the next advance
    /// re-locates it in the new list by path.
    pub fn notify_new_media(&mut self, media: Vec<PathBuf>) {
        if media == self.media {
            trace!("media list unchanged");
        } else {
            info!(count = media.len(), "media list replaced");
        }
        self.media = media;
        self.current_index = self.position_of_current();

        if self.pending.is_none() && !self.media.is_empty() {
            debug!("nothing scheduled; arming auto-advance");
            self.arm(self.options.interval, Tick::Advance);
        }
    }

    /// Timer callback entry. Only the pending handle is honoured.
    pub fn on_timer(&mut self, handle: TimerHandle, tick: Tick, now: Instant) {
        if self.pending != Some(handle) {
            debug!(?handle, ?tick, "stale timer ignored");
            return;
        }
        self.pending = None;
        match tick {
            Tick::Advance => self.advance(Trigger::Auto, now),
            Tick::VideoFrame => self.play_frame(now),
        }
    }

    fn show_image(&mut self, item: &Path) {
        match self.decoder.decode_image(item) {
            Ok(raster) => {
                self.sink.render(&raster);
                self.phase = Phase::ShowingImage;
                self.empty_video_skips = 0;
                self.update_highlight(item);
                self.zoom.reset();
                if self.paused {
                    self.zoom.init(raster.clone());
                }
                self.displayed = Some(raster);
                info!(
                    index = ?self.current_index,
                    path = %item.display(),
                    "showing image"
                );
            }
            Err(err) => warn!(path = %item.display(), "skipping image: {err}"),
        }
        self.arm(self.options.interval, Tick::Advance);
    }

    fn show_video(&mut self, item: &Path, now: Instant) {
        match self.decoder.decode_video(item) {
            Ok(clip) => {
                info!(
                    index = ?self.current_index,
                    path = %item.display(),
                    frames = clip.frames.len(),
                    fps = clip.fps,
                    "playing video"
                );
                self.zoom.reset();
                self.video.start(clip, self.options.speedup_factor, now);
                self.phase = Phase::ShowingVideo;
                self.displayed = None;
                self.update_highlight(item);
                self.play_frame(now);
            }
            Err(err) => {
                warn!(path = %item.display(), "skipping video: {err}");
                self.arm(self.options.interval, Tick::Advance);
            }
        }
    }

    fn play_frame(&mut self, now: Instant) {
        match self.video.step(self.paused, self.options.interval, now) {
            FrameStep::Render(index) => {
                if let Some(frame) = self.video.frame(index) {
                    trace!(index, "video frame");
                    self.sink.render(frame);
                }
                self.empty_video_skips = 0;
                self.arm(self.video.frame_delay(), Tick::VideoFrame);
            }
            FrameStep::Finished => {
                debug!("video played long enough");
                self.video.reset();
                self.advance(Trigger::Auto, now);
            }
            FrameStep::Empty => {
                self.video.reset();
                self.empty_video_skips += 1;
                if self.empty_video_skips > self.media.len() {
                    warn!("every listed video is empty; waiting for the next interval");
                    self.empty_video_skips = 0;
                    self.arm(self.options.interval, Tick::Advance);
                } else {
                    info!(path = ?self.current_item, "video has no frames; skipping");
                    self.advance(Trigger::Auto, now);
                }
            }
        }
    }

    /// Cancel whatever is pending and arm `tick` as the single outstanding timer.
    fn arm(&mut self, delay: Duration, tick: Tick) {
        self.cancel_pending();
        self.pending = Some(self.timers.schedule(delay, tick));
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.timers.cancel(handle);
        }
    }

    fn position_of_current(&self) -> Option<usize> {
        let item = self.current_item.as_ref()?;
        self.media.iter().position(|p| p == item)
    }

    fn refresh_clock(&mut self) {
        let text = chrono::Utc::now()
            .with_timezone(&self.options.clock.timezone)
            .format(&self.options.clock.format)
            .to_string();
        self.sink.set_clock(&text);
    }

    fn update_highlight(&mut self, item: &Path) {
        let recent = is_recent(item, SystemTime::now(), self.options.new_media_window);
        self.sink.set_highlight(recent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_always_lands_on_first() {
        assert_eq!(select_index(Trigger::Restart, Some(4), 5), 0);
        assert_eq!(select_index(Trigger::Restart, None, 5), 0);
    }

    #[test]
    fn prev_and_next_wrap() {
        assert_eq!(select_index(Trigger::Prev, Some(0), 3), 2);
        assert_eq!(select_index(Trigger::Next, Some(2), 3), 0);
        assert_eq!(select_index(Trigger::Next, Some(1), 3), 2);
        assert_eq!(select_index(Trigger::Prev, Some(2), 3), 1);
    }

    #[test]
    fn unset_or_vanished_item_starts_from_the_top() {
        assert_eq!(select_index(Trigger::Auto, None, 3), 0);
        assert_eq!(select_index(Trigger::Next, None, 3), 0);
        // -1 - 1 wraps to the end
        assert_eq!(select_index(Trigger::Prev, None, 3), 2);
    }

    #[test]
    fn auto_wraps_at_end() {
        assert_eq!(select_index(Trigger::Auto, Some(0), 1), 0);
        assert_eq!(select_index(Trigger::Auto, Some(1), 2), 0);
        assert_eq!(select_index(Trigger::Auto, Some(0), 2), 1);
    }
}
