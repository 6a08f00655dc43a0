use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by buffer and search operations.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("byte value {0} is outside 0..=255")]
    InvalidByte(u32),

    #[error("buffer is backed by a read-only mapping; load it fully before editing")]
    ReadOnly,

    #[error("operation requires {expected} mode")]
    WrongMode { expected: &'static str },

    #[error("invalid hex string: {0:?}")]
    InvalidHex(String),

    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to save file {path}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no file name to save to")]
    NoPath,

    #[error("invalid config {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, EditError>;
