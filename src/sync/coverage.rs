use std::collections::{BTreeMap, BTreeSet};

use crate::document::store::DocumentStore;
use crate::foundation::core::ShapeId;

/// Which sources are visually covered by an ancestor's render.
///
/// The nearest active ancestor is recorded as the cover. A source with more than one active
/// ancestor is also listed as ambiguous so callers can surface it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coverage {
    covered_by: BTreeMap<ShapeId, ShapeId>,
    ambiguous: BTreeSet<ShapeId>,
}

impl Coverage {
    /// `sources` are the shapes carrying an active effect stack.
    pub fn compute(store: &dyn DocumentStore, sources: &BTreeSet<ShapeId>) -> Self {
        let mut out = Self::default();
        for source in sources {
            let mut active = store
                .ancestors(source)
                .into_iter()
                .filter(|a| sources.contains(a));
            let Some(nearest) = active.next() else {
                continue;
            };
            let outer: Vec<ShapeId> = active.collect();
            if !outer.is_empty() {
                tracing::debug!(
                    source = %source,
                    nearest = %nearest,
                    outer = outer.len(),
                    "source covered by several active ancestors, nearest wins"
                );
                out.ambiguous.insert(source.clone());
            }
            out.covered_by.insert(source.clone(), nearest);
        }
        out
    }

    pub fn is_covered(&self, source: &ShapeId) -> bool {
        self.covered_by.contains_key(source)
    }

    pub fn cover_of(&self, source: &ShapeId) -> Option<&ShapeId> {
        self.covered_by.get(source)
    }

    pub fn covered(&self) -> &BTreeMap<ShapeId, ShapeId> {
        &self.covered_by
    }

    pub fn ambiguous(&self) -> &BTreeSet<ShapeId> {
        &self.ambiguous
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sync/coverage.rs"]
mod tests;
