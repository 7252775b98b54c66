/// Core error types for Speaker Tweaker
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `TweakerError`
pub type Result<T> = std::result::Result<T, TweakerError>;

/// Core error type for Speaker Tweaker
///
/// `InvalidConfiguration` and `ConfigUnavailable` are fatal at engine
/// construction. `UnsupportedVersion` and `RateMismatch` describe per-buffer
/// conditions; the engine reports them as diagnostics and keeps processing.
#[derive(Error, Debug)]
pub enum TweakerError {
    /// Construction parameters are unusable (e.g. zero channels)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The filter file could not be opened or mapped
    #[error("Filter file unavailable: {path}: {reason}")]
    ConfigUnavailable { path: PathBuf, reason: String },

    /// The filter file carries a format version this build does not understand
    #[error("Unsupported filter file version: {0} (expected 1)")]
    UnsupportedVersion(u32),

    /// Filter coefficients were designed for a different sampling rate
    #[error("Filter sampling rate {adopted} Hz does not match stream rate {stream} Hz")]
    RateMismatch { adopted: u32, stream: u32 },

    /// A filter file image is malformed (wrong size, truncated)
    #[error("Invalid filter file: {0}")]
    InvalidBlob(String),

    /// Interleaved buffers do not line up with the engine's channel count
    #[error("Buffer of {len} samples does not fit {channels} channels")]
    BufferMismatch { len: usize, channels: usize },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TweakerError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a config-unavailable error for the given path
    pub fn config_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ConfigUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid filter file error
    pub fn invalid_blob(msg: impl Into<String>) -> Self {
        Self::InvalidBlob(msg.into())
    }
}
