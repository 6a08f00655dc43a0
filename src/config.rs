use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{EditError, Result};

pub const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;
pub const CHUNK_SIZE: usize = 1024 * 1024;
pub const CACHE_CAPACITY: usize = 5;
pub const HISTORY_CAPACITY: usize = 100;
pub const SAMPLE_SIZE: usize = 4096;
pub const BYTES_PER_LINE: usize = 16;

/// Tunables for loading and editing.
///
/// Every field has a default, so a config file only needs the keys it
/// wants to override:
///
/// ```json
/// { "large_file_threshold": 52428800, "bytes_per_line": 32 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Files strictly larger than this are memory-mapped and read in chunks
    pub large_file_threshold: u64,
    pub chunk_size: usize,
    /// Maximum number of resident chunks
    pub cache_capacity: usize,
    /// Entries kept in each of the undo and redo logs
    pub history_capacity: usize,
    /// Bytes inspected when classifying binary vs text
    pub sample_size: usize,
    pub bytes_per_line: usize,
}

impl EditorConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| EditError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| EditError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            large_file_threshold: LARGE_FILE_THRESHOLD,
            chunk_size: CHUNK_SIZE,
            cache_capacity: CACHE_CAPACITY,
            history_capacity: HISTORY_CAPACITY,
            sample_size: SAMPLE_SIZE,
            bytes_per_line: BYTES_PER_LINE,
        }
    }
}
