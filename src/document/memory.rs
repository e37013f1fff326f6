use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::document::shape::{Shape, ShapeKind};
use crate::document::store::{
    DocumentStore, Mutation, MutationBatch, MutationListener, Patch, PatchOp, SubscriptionId,
};
use crate::foundation::core::{Affine, Point, Rect, ShapeId};
use crate::foundation::error::StoreError;

/// Deepest parent chain followed before a transform lookup gives up (cycle guard).
const MAX_DEPTH: usize = 256;

/// Thread-safe in-memory document store.
///
/// Listeners run synchronously on the writing thread after the write lock is released, so they
/// may read (or even patch) the store.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    listeners: Mutex<Vec<(SubscriptionId, MutationListener)>>,
    next_subscription: AtomicU64,
}

#[derive(Default)]
struct Inner {
    shapes: HashMap<ShapeId, Shape>,
    locked: HashSet<ShapeId>,
    revision: u64,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("InMemoryStore")
            .field("shapes", &inner.shapes.len())
            .field("locked", &inner.locked.len())
            .field("revision", &inner.revision)
            .finish()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `shapes`; no listeners are notified.
    pub fn with_shapes(shapes: impl IntoIterator<Item = Shape>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for s in shapes {
                inner.shapes.insert(s.id.clone(), s);
            }
        }
        store
    }

    /// Reject further writes to `id` with [`StoreError::Locked`].
    pub fn lock_shape(&self, id: &ShapeId) {
        self.inner.write().locked.insert(id.clone());
    }

    pub fn unlock_shape(&self, id: &ShapeId) {
        self.inner.write().locked.remove(id);
    }

    /// Number of successfully applied, non-empty patches.
    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    pub fn len(&self) -> usize {
        self.inner.read().shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().shapes.is_empty()
    }

    fn notify(&self, batch: &MutationBatch) {
        let listeners: Vec<MutationListener> =
            self.listeners.lock().iter().map(|(_, l)| l.clone()).collect();
        for l in listeners {
            l(batch);
        }
    }
}

impl Inner {
    fn sorted_children(&self, id: &ShapeId) -> Vec<Shape> {
        let mut kids: Vec<Shape> = self
            .shapes
            .values()
            .filter(|s| s.parent.as_ref() == Some(id))
            .cloned()
            .collect();
        kids.sort_by(|a, b| a.z_index.total_cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        kids
    }

    fn page_transform(&self, id: &ShapeId) -> Option<Affine> {
        let mut chain = Vec::new();
        let mut cur = Some(self.shapes.get(id)?);
        while let Some(s) = cur {
            if chain.len() >= MAX_DEPTH {
                return None;
            }
            chain.push(s.local_transform());
            cur = s.parent.as_ref().and_then(|p| self.shapes.get(p));
        }
        Some(chain.into_iter().rev().fold(Affine::IDENTITY, |acc, t| acc * t))
    }

    fn page_bounds(&self, id: &ShapeId, depth: usize) -> Option<Rect> {
        if depth > MAX_DEPTH {
            return None;
        }
        let shape = self.shapes.get(id)?;
        match shape.local_size() {
            Some((w, h)) => {
                let t = self.page_transform(id)?;
                Some(t.transform_rect_bbox(Rect::new(0.0, 0.0, w.max(0.0), h.max(0.0))))
            }
            None => {
                let mut acc: Option<Rect> = None;
                for child in self.sorted_children(id) {
                    if let Some(r) = self.page_bounds(&child.id, depth + 1) {
                        acc = Some(acc.map_or(r, |a| a.union(r)));
                    }
                }
                acc.or_else(|| {
                    let origin = self.page_transform(id)? * Point::ORIGIN;
                    Some(Rect::from_points(origin, origin))
                })
            }
        }
    }

    fn descendants(&self, id: &ShapeId) -> Vec<ShapeId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(cur) = stack.pop() {
            for s in self.shapes.values() {
                if s.parent.as_ref() == Some(&cur) && !out.contains(&s.id) {
                    out.push(s.id.clone());
                    stack.push(s.id.clone());
                }
            }
        }
        out
    }

    fn check(&self, op: &PatchOp, pending: &HashSet<ShapeId>) -> Result<(), StoreError> {
        match op {
            PatchOp::Create(shape) => {
                if self.locked.contains(&shape.id) {
                    return Err(StoreError::Locked(shape.id.clone()));
                }
                if let ShapeKind::Proxy(p) = &shape.kind
                    && p.source == shape.id
                {
                    return Err(StoreError::Rejected(format!(
                        "proxy '{}' cannot be its own source",
                        shape.id
                    )));
                }
                Ok(())
            }
            PatchOp::Update { id, .. } | PatchOp::Delete(id) => {
                if !self.shapes.contains_key(id) && !pending.contains(id) {
                    return Err(StoreError::NotFound(id.clone()));
                }
                if self.locked.contains(id) {
                    return Err(StoreError::Locked(id.clone()));
                }
                Ok(())
            }
        }
    }
}

impl DocumentStore for InMemoryStore {
    fn shape(&self, id: &ShapeId) -> Option<Shape> {
        self.inner.read().shapes.get(id).cloned()
    }

    fn all_shapes(&self) -> Vec<Shape> {
        let mut all: Vec<Shape> = self.inner.read().shapes.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    fn children(&self, id: &ShapeId) -> Vec<Shape> {
        self.inner.read().sorted_children(id)
    }

    fn page_transform(&self, id: &ShapeId) -> Option<Affine> {
        self.inner.read().page_transform(id)
    }

    fn page_bounds(&self, id: &ShapeId) -> Option<Rect> {
        self.inner.read().page_bounds(id, 0)
    }

    fn apply(&self, patch: Patch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        let batch = {
            let mut inner = self.inner.write();

            // Validate everything up front so the patch is all-or-nothing.
            let mut pending = HashSet::new();
            for op in &patch.ops {
                inner.check(op, &pending)?;
                if let PatchOp::Create(s) = op {
                    pending.insert(s.id.clone());
                }
            }

            let mut batch = MutationBatch::default();
            for op in patch.ops {
                match op {
                    PatchOp::Create(shape) => {
                        let id = shape.id.clone();
                        inner.shapes.insert(id.clone(), shape);
                        batch.mutations.push(Mutation::Created(id));
                    }
                    PatchOp::Update { id, update } => {
                        if let Some(shape) = inner.shapes.get_mut(&id)
                            && update.apply_to(shape)
                        {
                            batch.mutations.push(Mutation::Updated(id));
                        }
                    }
                    PatchOp::Delete(id) => {
                        let mut doomed = inner.descendants(&id);
                        doomed.push(id);
                        for d in doomed {
                            if inner.shapes.remove(&d).is_some() {
                                batch.mutations.push(Mutation::Deleted(d));
                            }
                        }
                    }
                }
            }
            if !batch.is_empty() {
                inner.revision += 1;
            }
            batch
        };

        if !batch.is_empty() {
            tracing::trace!(mutations = batch.mutations.len(), "store patch applied");
            self.notify(&batch);
        }
        Ok(())
    }

    fn subscribe(&self, listener: MutationListener) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed) + 1;
        self.listeners.lock().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().retain(|(sid, _)| *sid != id);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/memory.rs"]
mod tests;
