use std::path::PathBuf;

use thiserror::Error;

/// Library error type for slideshow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured media library is missing or not a directory.
    #[error("invalid media directory: {0}")]
    BadDir(String),

    /// An image or video could not be decoded.
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// The file extension is not something this build can decode.
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(PathBuf),

    /// A video decoded but reported no usable frame rate.
    #[error("video reports no frame rate: {0}")]
    ZeroFps(PathBuf),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn decode(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
