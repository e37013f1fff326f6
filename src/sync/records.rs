use std::collections::{BTreeMap, BTreeSet};

use crate::document::shape::Shape;
use crate::foundation::core::ShapeId;

/// `source -> proxy` mapping rebuilt from the document on every pass.
///
/// At most one proxy is kept per source. Proxies whose source is gone, and extra proxies for a
/// source that already has one, are reported as garbage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyRecord {
    by_source: BTreeMap<ShapeId, ShapeId>,
    garbage: Vec<ShapeId>,
}

impl ProxyRecord {
    pub fn scan(shapes: &[Shape]) -> Self {
        let existing: BTreeSet<&ShapeId> = shapes
            .iter()
            .filter(|s| !s.is_proxy())
            .map(|s| &s.id)
            .collect();

        let mut by_source: BTreeMap<ShapeId, ShapeId> = BTreeMap::new();
        let mut garbage = Vec::new();
        for shape in shapes {
            let Some(source) = shape.proxy_source() else {
                continue;
            };
            if !existing.contains(source) {
                garbage.push(shape.id.clone());
                continue;
            }
            match by_source.get(source) {
                None => {
                    by_source.insert(source.clone(), shape.id.clone());
                }
                Some(kept) => {
                    // Prefer the canonical id so repeated scans agree on the survivor.
                    let canonical = ShapeId::proxy_for(source);
                    if shape.id == canonical {
                        garbage.push(kept.clone());
                        by_source.insert(source.clone(), shape.id.clone());
                    } else {
                        garbage.push(shape.id.clone());
                    }
                }
            }
        }
        garbage.sort();
        Self { by_source, garbage }
    }

    pub fn proxy_of(&self, source: &ShapeId) -> Option<&ShapeId> {
        self.by_source.get(source)
    }

    pub fn insert(&mut self, source: ShapeId, proxy: ShapeId) {
        self.by_source.insert(source, proxy);
    }

    pub fn remove(&mut self, source: &ShapeId) -> Option<ShapeId> {
        self.by_source.remove(source)
    }

    /// Proxies to delete: orphaned or duplicated.
    pub fn garbage(&self) -> &[ShapeId] {
        &self.garbage
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ShapeId, &ShapeId)> {
        self.by_source.iter()
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sync/records.rs"]
mod tests;
