use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use chrono_tz::Tz;
use serde::Deserialize;

/// Upper bound for any configured duration (one year).
pub const MAX_CONFIGURED_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Local cache directory holding the downloaded photos and clips.
    pub media_library_path: PathBuf,
    /// Maximum number of items kept in the playlist, newest first.
    pub max_media_items: usize,
    /// Time an item remains on screen before auto-advance.
    #[serde(with = "humantime_serde")]
    pub slideshow_interval: Duration,
    /// How often the library is rescanned even without filesystem events.
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
    /// Items captured more recently than this get the "new" highlight.
    #[serde(with = "humantime_serde")]
    pub new_media_window: Duration,
    /// Target surface that decoded rasters are fit into.
    pub screen: ScreenOptions,
    /// Clock overlay refreshed on each slideshow tick.
    pub clock: ClockOptions,
    /// Frame capture and pacing of video clips.
    pub video: VideoOptions,
    /// Pan behaviour while paused.
    pub zoom: ZoomOptions,
    /// Where the snapshot sink writes the current frame; logging only when unset.
    pub output_path: Option<PathBuf>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.media_library_path.as_os_str().is_empty(),
            "media-library-path must be set"
        );
        ensure!(
            self.max_media_items > 0,
            "max-media-items must be greater than zero"
        );
        ensure!(
            !self.slideshow_interval.is_zero(),
            "slideshow-interval must be greater than zero"
        );
        ensure!(
            !self.refresh_interval.is_zero(),
            "refresh-interval must be greater than zero"
        );
        for (key, value) in [
            ("slideshow-interval", self.slideshow_interval),
            ("refresh-interval", self.refresh_interval),
            ("new-media-window", self.new_media_window),
        ] {
            ensure!(
                value <= MAX_CONFIGURED_DURATION,
                "{key} must be at most {}",
                humantime::format_duration(MAX_CONFIGURED_DURATION)
            );
        }
        self.screen.validate()?;
        self.clock.validate().context("invalid clock configuration")?;
        self.video.validate()?;
        ensure!(
            self.zoom.navigation_step_px > 0,
            "zoom.navigation-step-px must be greater than zero"
        );
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            media_library_path: PathBuf::new(),
            max_media_items: 30,
            slideshow_interval: Duration::from_secs(10),
            refresh_interval: Duration::from_secs(30 * 60),
            new_media_window: Duration::from_secs(24 * 60 * 60),
            screen: ScreenOptions::default(),
            clock: ClockOptions::default(),
            video: VideoOptions::default(),
            zoom: ZoomOptions::default(),
            output_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScreenOptions {
    pub width: u32,
    pub height: u32,
}

impl ScreenOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "screen dimensions must be positive"
        );
        Ok(())
    }
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClockOptions {
    pub timezone: Tz,
    /// strftime pattern for the overlay.
    pub format: String,
}

impl ClockOptions {
    fn validate(&self) -> Result<()> {
        ensure!(!self.format.trim().is_empty(), "clock.format must not be empty");
        Ok(())
    }
}

impl Default for ClockOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Canada::Mountain,
            format: "%H:%M".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct VideoOptions {
    /// Upper bound on frames kept per clip.
    pub max_frames: usize,
    /// Keep one decoded frame out of this many.
    pub frame_stride: usize,
    /// Multiplier applied to the nominal frame delay to make up for skipped frames.
    pub speedup_factor: f64,
}

impl VideoOptions {
    const fn default_max_frames() -> usize {
        500
    }

    const fn default_frame_stride() -> usize {
        2
    }

    const fn default_speedup_factor() -> f64 {
        0.25
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.max_frames > 0,
            "video.max-frames must be greater than zero"
        );
        ensure!(
            self.frame_stride > 0,
            "video.frame-stride must be greater than zero"
        );
        ensure!(
            self.speedup_factor > 0.0 && self.speedup_factor <= 1.0,
            "video.speedup-factor must be in (0, 1]"
        );
        Ok(())
    }
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            max_frames: Self::default_max_frames(),
            frame_stride: Self::default_frame_stride(),
            speedup_factor: Self::default_speedup_factor(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ZoomOptions {
    pub navigation_step_px: i64,
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            navigation_step_px: 15,
        }
    }
}
