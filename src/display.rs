use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use tracing::{debug, info, trace, warn};

/// Where the slideshow puts pixels and overlay state.
pub trait DisplaySink {
    fn render(&mut self, frame: &RgbaImage);
    /// Replace the picture with a text placeholder (e.g. nothing to show).
    fn show_placeholder(&mut self, text: &str);
    fn set_clock(&mut self, text: &str);
    fn set_paused(&mut self, paused: bool);
    /// Border highlight for recently received media.
    fn set_highlight(&mut self, highlight: bool);
}

/// Headless sink: keeps the latest frame as a PNG on disk for an external presenter.
#[derive(Debug, Default)]
pub struct SnapshotSink {
    output: Option<PathBuf>,
    clock: String,
    paused: bool,
    highlight: bool,
    frames_rendered: u64,
}

impl SnapshotSink {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    fn write_png(path: &Path, frame: &RgbaImage) -> Result<()> {
        let tmp = path.with_extension("tmp.png");
        frame
            .save_with_format(&tmp, ImageFormat::Png)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to move snapshot into {}", path.display()))?;
        Ok(())
    }
}

impl DisplaySink for SnapshotSink {
    fn render(&mut self, frame: &RgbaImage) {
        self.frames_rendered += 1;
        trace!(
            width = frame.width(),
            height = frame.height(),
            n = self.frames_rendered,
            "render"
        );
        if let Some(path) = &self.output {
            if let Err(err) = Self::write_png(path, frame) {
                warn!("snapshot failed: {err:#}");
            }
        }
    }

    fn show_placeholder(&mut self, text: &str) {
        info!(text, "placeholder shown");
        if let Some(path) = &self.output {
            // A black raster stands in for the text; presenters overlay their own label.
            let blank = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
            if let Err(err) = Self::write_png(path, &blank) {
                warn!("snapshot failed: {err:#}");
            }
        }
    }

    fn set_clock(&mut self, text: &str) {
        if self.clock != text {
            debug!(clock = text, "clock overlay");
            self.clock = text.to_string();
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            info!(paused, "pause indicator");
            self.paused = paused;
        }
    }

    fn set_highlight(&mut self, highlight: bool) {
        if self.highlight != highlight {
            debug!(highlight, "new-media border");
            self.highlight = highlight;
        }
    }
}
