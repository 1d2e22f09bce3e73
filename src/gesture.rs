//! Tap zones of the frame surface.
//!
//! The screen is a 3x3 grid. The top row always navigates: previous, pause,
//! next. While a paused still is zoomable the two lower rows drive the zoom
//! engine instead:
//!
//! ```text
//! +---------+---------+---------+
//! |  prev   |  pause  |  next   |
//! +---------+---------+---------+
//! | dezoom  |   up    |  zoom   |
//! +---------+---------+---------+
//! |  left   | bottom  |  right  |
//! +---------+---------+---------+
//! ```

use crate::events::Command;
use crate::slideshow::Trigger;
use crate::slideshow::zoom::{Direction, ZoomAction};

/// Map a tap to a command. Taps outside the surface are ignored.
pub fn classify_tap(
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    zoom_active: bool,
) -> Option<Command> {
    if width == 0 || height == 0 || x >= width || y >= height {
        return None;
    }
    let column = cell(x, width);
    let row = cell(y, height);

    if row == 0 || !zoom_active {
        return Some(match column {
            0 => Command::Navigate(Trigger::Prev),
            1 => Command::TogglePause,
            _ => Command::Navigate(Trigger::Next),
        });
    }

    let (action, direction) = match (row, column) {
        (1, 0) => (Some(ZoomAction::Dezoom), None),
        (1, 1) => (None, Some(Direction::Up)),
        (1, _) => (Some(ZoomAction::Zoom), None),
        (_, 0) => (None, Some(Direction::Left)),
        (_, 1) => (None, Some(Direction::Bottom)),
        (_, _) => (None, Some(Direction::Right)),
    };
    Some(Command::Zoom { action, direction })
}

fn cell(pos: u32, extent: u32) -> u32 {
    (u64::from(pos) * 3 / u64::from(extent)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 300;
    const H: u32 = 300;

    #[test]
    fn top_row_navigates_regardless_of_zoom() {
        for zoom in [false, true] {
            assert_eq!(
                classify_tap(10, 10, W, H, zoom),
                Some(Command::Navigate(Trigger::Prev))
            );
            assert_eq!(classify_tap(150, 50, W, H, zoom), Some(Command::TogglePause));
            assert_eq!(
                classify_tap(299, 99, W, H, zoom),
                Some(Command::Navigate(Trigger::Next))
            );
        }
    }

    #[test]
    fn lower_rows_zoom_only_when_active() {
        assert_eq!(
            classify_tap(250, 150, W, H, true),
            Some(Command::Zoom {
                action: Some(ZoomAction::Zoom),
                direction: None
            })
        );
        assert_eq!(
            classify_tap(150, 250, W, H, true),
            Some(Command::Zoom {
                action: None,
                direction: Some(Direction::Bottom)
            })
        );
        assert_eq!(
            classify_tap(250, 150, W, H, false),
            Some(Command::Navigate(Trigger::Next))
        );
        assert_eq!(classify_tap(150, 250, W, H, false), Some(Command::TogglePause));
    }

    #[test]
    fn outside_taps_are_ignored() {
        assert_eq!(classify_tap(W, 0, W, H, false), None);
        assert_eq!(classify_tap(0, 0, 0, 0, false), None);
    }
}
