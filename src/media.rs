//! Media classification and the library listing that feeds the playlist.

use std::cmp::Reverse;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use walkdir::{DirEntry, WalkDir};

use crate::config::Configuration;
use crate::error::Error;

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const VIDEO_EXTS: &[&str] = &["mp4", "avi", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify by extension (case-insensitive). `None` for anything the frame ignores.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)?;
        if IMAGE_EXTS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Capture time embedded in downloaded file names: `<prefix>_<unix-millis>_<rest>`.
#[must_use]
pub fn capture_timestamp(path: &Path) -> Option<SystemTime> {
    let name = path.file_name()?.to_str()?;
    let mut parts = name.split('_');
    let _prefix = parts.next()?;
    let millis = parts.next()?;
    // The rest must exist too, otherwise the second field is the extension-bearing tail.
    parts.next()?;
    let millis: u64 = millis.parse().ok()?;
    UNIX_EPOCH.checked_add(Duration::from_millis(millis))
}

/// Whether the item was captured within `window` of `now`.
#[must_use]
pub fn is_recent(path: &Path, now: SystemTime, window: Duration) -> bool {
    match capture_timestamp(path) {
        Some(at) => match now.duration_since(at) {
            Ok(age) => age < window,
            // Clock skew: a timestamp from the future is as new as it gets.
            Err(_) => true,
        },
        None => false,
    }
}

/// Supplies the ordered list of displayable media, newest first.
pub trait MediaSource {
    fn list_media(&self) -> Result<Vec<PathBuf>, Error>;
}

/// Lists the local media cache directory.
#[derive(Debug, Clone)]
pub struct LibraryScanner {
    root: PathBuf,
    max_items: usize,
}

impl LibraryScanner {
    pub fn new(root: impl Into<PathBuf>, max_items: usize) -> Self {
        Self {
            root: root.into(),
            max_items,
        }
    }

    pub fn from_config(cfg: &Configuration) -> Self {
        Self::new(cfg.media_library_path.clone(), cfg.max_media_items)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MediaSource for LibraryScanner {
    fn list_media(&self) -> Result<Vec<PathBuf>, Error> {
        if !self.root.is_dir() {
            return Err(Error::BadDir(self.root.display().to_string()));
        }

        let mut found: Vec<(Option<SystemTime>, PathBuf)> = WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e))
            .flatten()
            .filter(|e| e.file_type().is_file())
            .map(DirEntry::into_path)
            .filter(|p| MediaKind::of(p).is_some())
            .map(|p| (capture_timestamp(&p), p))
            .collect();

        // Newest first; untimestamped files last, then by name for a stable order.
        found.sort_by(|(ta, pa), (tb, pb)| {
            Reverse(*ta).cmp(&Reverse(*tb)).then_with(|| pa.cmp(pb))
        });
        found.truncate(self.max_items);
        Ok(found.into_iter().map(|(_, p)| p).collect())
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with('.'))
}
