//! Crop-window magnification of a paused frame.
//!
//! The visible window is centred on the raster centre plus a persistent pan
//! offset. Its half-extent per axis is a fixed percentage of the raster
//! dimension picked from [`ZoomLevel`]. Whenever the window would leave the
//! raster it is pushed back inside and the corrected offset is kept, so
//! panning past an edge sticks to that edge.

use image::RgbaImage;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomAction {
    Zoom,
    Dezoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Right,
    Bottom,
    Left,
}

/// Discrete magnification steps, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ZoomLevel {
    NoZoom,
    Zoom1,
    Zoom2,
    Zoom3,
}

impl ZoomLevel {
    pub const ALL: [Self; 4] = [Self::NoZoom, Self::Zoom1, Self::Zoom2, Self::Zoom3];

    /// Half-extent of the crop window as a percentage of the raster dimension.
    pub const fn ratio_percent(self) -> u32 {
        match self {
            Self::NoZoom => 50,
            Self::Zoom1 => 30,
            Self::Zoom2 => 20,
            Self::Zoom3 => 10,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }

    /// One step tighter; stays put at the tightest level.
    pub fn tighter(self) -> Self {
        Self::ALL[(self.index() + 1).min(Self::ALL.len() - 1)]
    }

    /// One step looser; stays put at [`ZoomLevel::NoZoom`].
    pub fn looser(self) -> Self {
        Self::ALL[self.index().saturating_sub(1)]
    }
}

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Window `[start, end)` along one axis for a raster dimension, before clamping.
fn axis_window(dim: u32, level: ZoomLevel, offset: i64) -> (i64, i64) {
    let dim = i64::from(dim);
    let radius = dim * i64::from(level.ratio_percent()) / 100;
    // A radius of zero on tiny rasters still shows one pixel.
    let span = (2 * radius).max(1);
    let start = dim / 2 - radius + offset;
    (start, start + span)
}

/// Shift `[start, end)` back inside `[0, dim)`. Returns the shifted window and
/// the offset that produces it.
fn clamp_axis(start: i64, end: i64, offset: i64, dim: u32) -> (i64, i64, i64) {
    let dim = i64::from(dim);
    let mut shift = 0;
    if start < 0 {
        shift = -start;
    }
    if end + shift > dim {
        shift = dim - end;
    }
    (start + shift, end + shift, offset + shift)
}

#[derive(Debug)]
pub struct Zoom {
    level: ZoomLevel,
    offset_x: i64,
    offset_y: i64,
    raster: RgbaImage,
    ready: bool,
    step: i64,
}

impl Zoom {
    /// `step` is the pan distance in pixels for one directional nudge.
    pub fn new(step: i64) -> Self {
        Self {
            level: ZoomLevel::NoZoom,
            offset_x: 0,
            offset_y: 0,
            raster: RgbaImage::new(0, 0),
            ready: false,
            step,
        }
    }

    /// Capture `raster` as the zoom source. An empty raster leaves the engine not ready.
    pub fn init(&mut self, raster: RgbaImage) {
        self.reset();
        if raster.width() == 0 || raster.height() == 0 {
            debug!("zoom init ignored: empty raster");
            return;
        }
        self.raster = raster;
        self.ready = true;
    }

    pub fn reset(&mut self) {
        self.level = ZoomLevel::NoZoom;
        self.offset_x = 0;
        self.offset_y = 0;
        self.raster = RgbaImage::new(0, 0);
        self.ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn level(&self) -> ZoomLevel {
        self.level
    }

    pub fn offsets(&self) -> (i64, i64) {
        (self.offset_x, self.offset_y)
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Apply an optional zoom step and an optional pan nudge, then return the
    /// visible part of the raster. Returns an empty buffer when not ready.
    pub fn set_zoom(
        &mut self,
        action: Option<ZoomAction>,
        direction: Option<Direction>,
    ) -> RgbaImage {
        if !self.ready {
            warn!("set_zoom: no raster to zoom into");
            return RgbaImage::new(0, 0);
        }

        match action {
            Some(ZoomAction::Zoom) => self.level = self.level.tighter(),
            Some(ZoomAction::Dezoom) => self.level = self.level.looser(),
            None => {}
        }

        let (mut dx, mut dy) = (0, 0);
        match direction {
            Some(Direction::Up) => dy = -self.step,
            Some(Direction::Bottom) => dy = self.step,
            Some(Direction::Left) => dx = -self.step,
            Some(Direction::Right) => dx = self.step,
            None => {}
        }

        let rect = self.clamped_rect(self.offset_x + dx, self.offset_y + dy);
        debug!(
            level = ?self.level,
            offset_x = self.offset_x,
            offset_y = self.offset_y,
            ?rect,
            "zoom window"
        );
        image::imageops::crop_imm(&self.raster, rect.x0, rect.y0, rect.width(), rect.height())
            .to_image()
    }

    /// Current visible window without changing anything.
    pub fn visible_rect(&self) -> Option<CropRect> {
        self.ready.then(|| self.window(self.offset_x, self.offset_y).0)
    }

    fn clamped_rect(&mut self, offset_x: i64, offset_y: i64) -> CropRect {
        let (rect, offset_x, offset_y) = self.window(offset_x, offset_y);
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        rect
    }

    fn window(&self, offset_x: i64, offset_y: i64) -> (CropRect, i64, i64) {
        let (w, h) = self.raster.dimensions();
        let (x0, x1) = axis_window(w, self.level, offset_x);
        let (y0, y1) = axis_window(h, self.level, offset_y);
        let (x0, x1, offset_x) = clamp_axis(x0, x1, offset_x, w);
        let (y0, y1, offset_y) = clamp_axis(y0, y1, offset_y, h);
        let rect = CropRect {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        };
        (rect, offset_x, offset_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_steps_clamp_at_both_ends() {
        assert_eq!(ZoomLevel::NoZoom.looser(), ZoomLevel::NoZoom);
        assert_eq!(ZoomLevel::NoZoom.tighter(), ZoomLevel::Zoom1);
        assert_eq!(ZoomLevel::Zoom2.tighter(), ZoomLevel::Zoom3);
        assert_eq!(ZoomLevel::Zoom3.tighter(), ZoomLevel::Zoom3);
        assert_eq!(ZoomLevel::Zoom3.looser(), ZoomLevel::Zoom2);
    }

    #[test]
    fn clamp_axis_pushes_back_inside() {
        assert_eq!(clamp_axis(-5, 15, 0, 100), (0, 20, 5));
        assert_eq!(clamp_axis(90, 110, 40, 100), (80, 100, 30));
        assert_eq!(clamp_axis(10, 30, 3, 100), (10, 30, 3));
    }

    #[test]
    fn axis_window_matches_ratio() {
        // 100px at 10%: radius 10 around centre 50
        assert_eq!(axis_window(100, ZoomLevel::Zoom3, 0), (40, 60));
        assert_eq!(axis_window(101, ZoomLevel::NoZoom, 0), (0, 100));
        assert_eq!(axis_window(1, ZoomLevel::NoZoom, 0), (0, 1));
    }

    #[test]
    fn no_zoom_covers_whole_even_raster() {
        let mut zoom = Zoom::new(15);
        zoom.init(RgbaImage::new(40, 30));
        let out = zoom.set_zoom(None, None);
        assert_eq!(out.dimensions(), (40, 30));
    }

    #[test]
    fn empty_raster_keeps_engine_idle() {
        let mut zoom = Zoom::new(15);
        zoom.init(RgbaImage::new(0, 10));
        assert!(!zoom.is_ready());
        assert_eq!(zoom.width(), 0);
        assert_eq!(zoom.set_zoom(Some(ZoomAction::Zoom), None).len(), 0);
        assert_eq!(zoom.level(), ZoomLevel::NoZoom);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut zoom = Zoom::new(15);
        zoom.init(RgbaImage::new(10, 10));
        zoom.set_zoom(Some(ZoomAction::Zoom), Some(Direction::Left));
        zoom.reset();
        zoom.reset();
        assert!(!zoom.is_ready());
        assert_eq!(zoom.level(), ZoomLevel::NoZoom);
        assert_eq!(zoom.offsets(), (0, 0));
        assert_eq!((zoom.width(), zoom.height()), (0, 0));
    }
}
