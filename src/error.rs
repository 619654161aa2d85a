//! Typed error taxonomy for the acquisition and analysis pipeline.
//!
//! Each variant maps to one of the failure classes in the component design:
//! config errors are fatal at startup, device/io/format/compute errors are
//! fatal for the current tile only, and drop accounting is handled out of
//! band (it is a counter, not an error).

use std::path::PathBuf;

/// Top-level error type returned by every pipeline component.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or unreadable configuration (env file, required key).
    #[error("configuration error: {0}")]
    Config(String),

    /// SDR device open/configure/start/stop failure.
    #[error("device error: {0}")]
    Device(String),

    /// File open/read/write/mmap failure.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed on-disk data: odd CS8 length, truncated file, bad CSV row.
    #[error("format error: {0}")]
    Format(String),

    /// Numerical precondition violated: insufficient samples, allocation failure.
    #[error("compute error: {0}")]
    Compute(String),
}

impl CoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
