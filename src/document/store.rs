use std::sync::Arc;

use crate::document::shape::{Shape, ShapeUpdate};
use crate::foundation::core::{Affine, Rect, ShapeId};
use crate::foundation::error::StoreError;

pub type SubscriptionId = u64;

/// Synchronous mutation listener, called after every applied patch.
///
/// Stores must invoke it on the thread that called [`DocumentStore::apply`], before `apply`
/// returns. The engine tells its own writes apart from user writes by the writing thread while
/// the write is in progress, so a store that queues batches for a later tick or another thread
/// would feed the engine's writes back to it as resyncs.
pub type MutationListener = Arc<dyn Fn(&MutationBatch) + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub enum PatchOp {
    Create(Shape),
    Update { id: ShapeId, update: ShapeUpdate },
    Delete(ShapeId),
}

/// An atomic list of operations: either all apply or none do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    pub ops: Vec<PatchOp>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, shape: Shape) -> Self {
        self.ops.push(PatchOp::Create(shape));
        self
    }

    pub fn update(mut self, id: ShapeId, update: ShapeUpdate) -> Self {
        self.ops.push(PatchOp::Update { id, update });
        self
    }

    pub fn delete(mut self, id: ShapeId) -> Self {
        self.ops.push(PatchOp::Delete(id));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Created(ShapeId),
    Updated(ShapeId),
    Deleted(ShapeId),
}

impl Mutation {
    pub fn id(&self) -> &ShapeId {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Deleted(id) => id,
        }
    }
}

/// Everything one patch changed, in application order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub mutations: Vec<Mutation>,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ShapeId> {
        self.mutations.iter().map(Mutation::id)
    }
}

/// The shape-graph document the engine reads and patches.
///
/// Implementations must be safe to call from inside a listener.
pub trait DocumentStore: Send + Sync {
    fn shape(&self, id: &ShapeId) -> Option<Shape>;

    fn all_shapes(&self) -> Vec<Shape>;

    /// Direct children of `id` in draw order (back to front).
    fn children(&self, id: &ShapeId) -> Vec<Shape>;

    /// Transform from `id`'s local space to page space.
    fn page_transform(&self, id: &ShapeId) -> Option<Affine>;

    /// Page-space axis-aligned bounding box of `id` and its descendants.
    fn page_bounds(&self, id: &ShapeId) -> Option<Rect>;

    fn apply(&self, patch: Patch) -> Result<(), StoreError>;

    /// Register `listener`. It must run synchronously inside `apply`, on the calling thread;
    /// see [`MutationListener`].
    fn subscribe(&self, listener: MutationListener) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    /// Ancestors of `id`, nearest first.
    fn ancestors(&self, id: &ShapeId) -> Vec<ShapeId> {
        let mut out = Vec::new();
        let mut cur = self.shape(id).and_then(|s| s.parent);
        while let Some(pid) = cur {
            if out.contains(&pid) || pid == *id {
                break;
            }
            cur = self.shape(&pid).and_then(|s| s.parent);
            out.push(pid);
        }
        out
    }

    /// `id` followed by all of its descendants, depth first in draw order.
    fn subtree(&self, id: &ShapeId) -> Vec<ShapeId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(cur) = stack.pop() {
            if out.contains(&cur) {
                continue;
            }
            for child in self.children(&cur).into_iter().rev() {
                stack.push(child.id);
            }
            out.push(cur);
        }
        out
    }

    fn update(&self, id: &ShapeId, update: ShapeUpdate) -> Result<(), StoreError> {
        self.apply(Patch::new().update(id.clone(), update))
    }
}
