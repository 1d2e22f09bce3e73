use std::path::PathBuf;

use crate::slideshow::Trigger;
use crate::slideshow::zoom::{Direction, ZoomAction};

/// Input layer -> player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Navigate(Trigger),
    TogglePause,
    Zoom {
        action: Option<ZoomAction>,
        direction: Option<Direction>,
    },
    /// Screen tap in pixels; resolved against the current pause/zoom state.
    Tap { x: u32, y: u32 },
    Quit,
}

/// Files -> player: the complete listing, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaListing(pub Vec<PathBuf>);
