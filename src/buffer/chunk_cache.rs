use std::collections::BTreeMap;

/// Bounded cache of fixed-size chunks pulled from a backing byte source.
///
/// Chunks are indexed by `position / chunk_size`. When an insertion pushes
/// the cache over capacity, the chunk with the numerically smallest index
/// other than the one just requested is evicted. This is index order, not
/// recency: scrolling backwards after reading forwards refetches the early
/// chunks first.
#[derive(Debug, Clone)]
pub struct ChunkCache {
    chunks: BTreeMap<usize, Vec<u8>>,
    chunk_size: usize,
    capacity: usize,
    loads: usize,
}

impl ChunkCache {
    pub fn new(chunk_size: usize, capacity: usize) -> Self {
        Self {
            chunks: BTreeMap::new(),
            chunk_size: chunk_size.max(1),
            capacity: capacity.max(1),
            loads: 0,
        }
    }

    /// Chunk index and in-chunk offset for an absolute position
    pub fn locate(&self, position: usize) -> (usize, usize) {
        (position / self.chunk_size, position % self.chunk_size)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.chunks.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Resident chunk indices in ascending order
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.chunks.keys().copied()
    }

    /// Number of times a chunk was copied out of the source
    pub fn load_count(&self) -> usize {
        self.loads
    }

    /// Return chunk `index`, copying it out of `source` first if absent.
    ///
    /// A chunk past the end of `source` is cached as empty; the last chunk is
    /// clamped at end of source.
    pub fn get_or_load(&mut self, index: usize, source: &[u8]) -> &[u8] {
        if !self.chunks.contains_key(&index) {
            let start = index.saturating_mul(self.chunk_size).min(source.len());
            let end = start.saturating_add(self.chunk_size).min(source.len());
            self.chunks.insert(index, source[start..end].to_vec());
            self.loads += 1;
            tracing::debug!(chunk = index, bytes = end - start, "loaded chunk");
            self.evict_excess(index);
        }

        self.chunks.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    fn evict_excess(&mut self, keep: usize) {
        while self.chunks.len() > self.capacity {
            let Some(victim) = self.chunks.keys().copied().find(|&index| index != keep) else {
                break;
            };
            self.chunks.remove(&victim);
            tracing::debug!(chunk = victim, "evicted chunk");
        }
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
