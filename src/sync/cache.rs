use std::collections::HashMap;

use tokio::time::Instant;

use crate::foundation::core::ShapeId;
use crate::pixels::codec::ImageHandle;

/// One rendered proxy image.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterCacheEntry {
    pub handle: ImageHandle,
    pub width: u32,
    pub height: u32,
    pub rendered_at: Instant,
}

/// Last-write-wins map of rendered images, keyed by proxy id.
#[derive(Debug, Default)]
pub struct RasterCache {
    entries: HashMap<ShapeId, RasterCacheEntry>,
}

impl RasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `entry`, returning whatever it replaced.
    pub fn insert(&mut self, proxy: ShapeId, entry: RasterCacheEntry) -> Option<RasterCacheEntry> {
        self.entries.insert(proxy, entry)
    }

    pub fn get(&self, proxy: &ShapeId) -> Option<&RasterCacheEntry> {
        self.entries.get(proxy)
    }

    pub fn remove(&mut self, proxy: &ShapeId) -> Option<RasterCacheEntry> {
        self.entries.remove(proxy)
    }

    pub fn contains(&self, proxy: &ShapeId) -> bool {
        self.entries.contains_key(proxy)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(proxy, width, height)` for every entry, sorted by proxy id.
    pub fn summary(&self) -> Vec<(ShapeId, u32, u32)> {
        let mut out: Vec<_> = self
            .entries
            .iter()
            .map(|(id, e)| (id.clone(), e.width, e.height))
            .collect();
        out.sort();
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sync/cache.rs"]
mod tests;
