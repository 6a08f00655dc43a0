use memmap2::Mmap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use super::chunk_cache::ChunkCache;

/// Backing store for a buffer's bytes
#[derive(Debug)]
pub(crate) enum Storage {
    /// Whole file in memory; the only mutable representation
    Resident(Vec<u8>),
    /// Read-only mapping read through a bounded chunk cache
    Mapped(MappedFile),
}

impl Storage {
    pub fn len(&self) -> usize {
        match self {
            Storage::Resident(data) => data.len(),
            Storage::Mapped(mapped) => mapped.len(),
        }
    }

    /// Bytes `[start, start + len)`, clamped at the end of content
    pub fn read_range(&mut self, start: usize, len: usize) -> Vec<u8> {
        match self {
            Storage::Resident(data) => crate::hex::byte_range(data, start, len).to_vec(),
            Storage::Mapped(mapped) => mapped.read_range(start, len),
        }
    }

    /// Every byte without going through the chunk cache
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Resident(data) => data,
            Storage::Mapped(mapped) => mapped.bytes(),
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Storage::Resident(Vec::new())
    }
}

/// Read-only memory mapping of a large file.
///
/// The mapping is released by `close` (idempotent) or on drop.
#[derive(Debug)]
pub(crate) struct MappedFile {
    map: Option<Mmap>,
    path: PathBuf,
    len: usize,
    cache: ChunkCache,
}

impl MappedFile {
    pub fn open(path: &Path, chunk_size: usize, cache_capacity: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and concurrent external modification
        // of the file is unsupported.
        let map = unsafe { Mmap::map(&file)? };
        let len = map.len();

        Ok(Self {
            map: Some(map),
            path: path.to_path_buf(),
            len,
            cache: ChunkCache::new(chunk_size, cache_capacity),
        })
    }

    pub fn len(&self) -> usize {
        if self.map.is_some() {
            self.len
        } else {
            0
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    /// Fetch a whole chunk through the cache
    pub fn chunk(&mut self, index: usize) -> &[u8] {
        let Some(map) = self.map.as_deref() else {
            return &[];
        };
        self.cache.get_or_load(index, map)
    }

    /// Read a range through the cache, crossing chunk boundaries as needed
    pub fn read_range(&mut self, start: usize, len: usize) -> Vec<u8> {
        let Some(map) = self.map.as_deref() else {
            return Vec::new();
        };

        let end = start.saturating_add(len).min(map.len());
        let mut out = Vec::with_capacity(end.saturating_sub(start));
        let mut position = start;

        while position < end {
            let (index, offset) = self.cache.locate(position);
            let chunk = self.cache.get_or_load(index, map);
            if offset >= chunk.len() {
                break;
            }
            let take = (chunk.len() - offset).min(end - position);
            out.extend_from_slice(&chunk[offset..offset + take]);
            position += take;
        }

        out
    }

    /// Pass-through copy of the backing file to `target`.
    ///
    /// Copying onto the backing file itself is a no-op: a mapped buffer is
    /// never mutated, so the content on disk is already current.
    pub fn copy_to(&self, target: &Path) -> io::Result<()> {
        if same_file(&self.path, target) {
            return Ok(());
        }
        reflink_copy::reflink_or_copy(&self.path, target)?;
        Ok(())
    }

    pub fn close(&mut self) {
        if self.map.take().is_some() {
            tracing::debug!(path = %self.path.display(), "released mapping");
        }
        self.cache.clear();
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
