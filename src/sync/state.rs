use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use tokio::time::Instant;

use crate::foundation::core::ShapeId;
use crate::sync::signature::RenderSignature;
use crate::sync::visibility::SourceState;

/// Engine bookkeeping for one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SourceEntry {
    pub(crate) state: SourceState,
    /// Signature observed on the latest pass.
    pub(crate) signature: Option<RenderSignature>,
    /// Signature of the raster currently on the proxy.
    pub(crate) rendered: Option<RenderSignature>,
    /// Bumped on every invalidation and every issued render.
    pub(crate) token: u64,
    pub(crate) in_flight: Option<u64>,
    pub(crate) attempts: u32,
    pub(crate) parked: bool,
    pub(crate) retry_at: Option<Instant>,
    pub(crate) covered: bool,
}

impl Default for SourceEntry {
    fn default() -> Self {
        Self {
            state: SourceState::RenderPending,
            signature: None,
            rendered: None,
            token: 0,
            in_flight: None,
            attempts: 0,
            parked: false,
            retry_at: None,
            covered: false,
        }
    }
}

impl SourceEntry {
    /// Uncovered and the proxy's raster does not match the current signature.
    pub(crate) fn is_dirty(&self) -> bool {
        !self.covered && self.signature.is_some() && self.rendered != self.signature
    }

    pub(crate) fn raster_current(&self) -> bool {
        self.signature.is_some() && self.rendered == self.signature
    }

    fn reset_retries(&mut self) {
        self.attempts = 0;
        self.parked = false;
        self.retry_at = None;
    }
}

/// How a finished render relates to the source's current token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Completion {
    Current,
    Stale,
}

/// Outcome of recording a failed render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Retry {
    At(Instant),
    Parked,
}

#[derive(Debug, Default)]
pub(crate) struct SyncState {
    entries: BTreeMap<ShapeId, SourceEntry>,
}

impl SyncState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, id: &ShapeId) -> Option<&SourceEntry> {
        self.entries.get(id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ShapeId, &SourceEntry)> {
        self.entries.iter()
    }

    /// Drop entries for ids not in `live`, returning them.
    pub(crate) fn retain_only(&mut self, live: &BTreeSet<ShapeId>) -> Vec<ShapeId> {
        let gone: Vec<ShapeId> = self
            .entries
            .keys()
            .filter(|id| !live.contains(*id))
            .cloned()
            .collect();
        for id in &gone {
            self.entries.remove(id);
        }
        gone
    }

    /// Record the signature seen this pass. A change invalidates any in-flight render and
    /// clears the retry budget. Returns whether the signature changed.
    pub(crate) fn observe(
        &mut self,
        id: &ShapeId,
        signature: RenderSignature,
        covered: bool,
    ) -> bool {
        let entry = self.entries.entry(id.clone()).or_default();
        entry.covered = covered;
        if entry.signature == Some(signature) {
            return false;
        }
        entry.signature = Some(signature);
        entry.token += 1;
        entry.in_flight = None;
        entry.reset_retries();
        true
    }

    /// Store the state resolved for this pass; returns the previous one.
    pub(crate) fn set_state(&mut self, id: &ShapeId, state: SourceState) -> Option<SourceState> {
        let entry = self.entries.get_mut(id)?;
        let prev = entry.state;
        if prev.is_suspended() && !state.is_suspended() {
            entry.reset_retries();
        }
        entry.state = state;
        Some(prev)
    }

    /// Start a render: returns the fresh token and the signature it renders.
    pub(crate) fn issue(&mut self, id: &ShapeId) -> Option<(u64, RenderSignature)> {
        let entry = self.entries.get_mut(id)?;
        let signature = entry.signature?;
        entry.token += 1;
        entry.in_flight = Some(entry.token);
        Some((entry.token, signature))
    }

    pub(crate) fn complete(&mut self, id: &ShapeId, token: u64) -> Completion {
        match self.entries.get_mut(id) {
            Some(entry) if entry.token == token && entry.in_flight == Some(token) => {
                entry.in_flight = None;
                Completion::Current
            }
            _ => Completion::Stale,
        }
    }

    pub(crate) fn mark_rendered(&mut self, id: &ShapeId, signature: RenderSignature) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.rendered = Some(signature);
            entry.reset_retries();
        }
    }

    /// The proxy lost its raster (deleted or recreated).
    pub(crate) fn clear_rendered(&mut self, id: &ShapeId) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.rendered = None;
        }
    }

    pub(crate) fn mark_failed(
        &mut self,
        id: &ShapeId,
        now: Instant,
        retry_delay: Duration,
        max_attempts: u32,
    ) -> Option<Retry> {
        let entry = self.entries.get_mut(id)?;
        entry.attempts += 1;
        if entry.attempts >= max_attempts {
            entry.parked = true;
            entry.retry_at = None;
            Some(Retry::Parked)
        } else {
            let at = now + retry_delay;
            entry.retry_at = Some(at);
            Some(Retry::At(at))
        }
    }

    fn waiting(entry: &SourceEntry) -> bool {
        entry.is_dirty()
            && entry.state.accepts_renders()
            && entry.in_flight.is_none()
            && !entry.parked
    }

    /// Dirty sources that may be rendered at `now`, in id order.
    pub(crate) fn renderable(&self, now: Instant) -> Vec<ShapeId> {
        self.entries
            .iter()
            .filter(|(_, e)| Self::waiting(e) && e.retry_at.is_none_or(|t| t <= now))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Earliest pending retry after `now`.
    pub(crate) fn next_retry(&self, now: Instant) -> Option<Instant> {
        self.entries
            .values()
            .filter(|e| Self::waiting(e))
            .filter_map(|e| e.retry_at)
            .filter(|t| *t > now)
            .min()
    }

    pub(crate) fn in_flight_count(&self) -> usize {
        self.entries.values().filter(|e| e.in_flight.is_some()).count()
    }

    pub(crate) fn dirty(&self) -> BTreeSet<ShapeId> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_dirty())
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sync/state.rs"]
mod tests;
