use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::ShapeId;
use crate::sync::visibility::SourceState;

/// Running counters since install.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub mutation_batches: u64,
    pub sync_passes: u64,
    pub renders_issued: u64,
    pub renders_applied: u64,
    /// Completions dropped because a newer token had been issued.
    pub renders_discarded: u64,
    pub renders_failed: u64,
    pub renders_timed_out: u64,
    pub writes_rejected: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSnapshot {
    pub state: SourceState,
    pub proxy: Option<ShapeId>,
    pub dirty: bool,
    pub token: u64,
    pub in_flight: bool,
    pub attempts: u32,
    pub parked: bool,
    pub covered_by: Option<ShapeId>,
    pub signature: Option<String>,
}

/// Point-in-time copy of the engine's bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub sources: BTreeMap<ShapeId, SourceSnapshot>,
    pub dirty: BTreeSet<ShapeId>,
    /// `source -> proxy`.
    pub proxies: BTreeMap<ShapeId, ShapeId>,
    /// `source -> nearest covering ancestor`.
    pub covered: BTreeMap<ShapeId, ShapeId>,
    pub ambiguous_coverage: BTreeSet<ShapeId>,
    /// `(proxy, width, height)` of every cached raster.
    pub cache: Vec<(ShapeId, u32, u32)>,
    pub interacting: bool,
    pub stats: EngineStats,
}

impl EngineSnapshot {
    pub fn state_of(&self, source: &ShapeId) -> Option<SourceState> {
        self.sources.get(source).map(|s| s.state)
    }

    pub fn is_dirty(&self, source: &ShapeId) -> bool {
        self.dirty.contains(source)
    }

    pub fn proxy_of(&self, source: &ShapeId) -> Option<&ShapeId> {
        self.proxies.get(source)
    }
}
