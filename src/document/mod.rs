//! Shape-graph document model: shapes, the store interface the engine consumes, and an
//! in-memory store implementation.

pub(crate) mod memory;
pub(crate) mod shape;
pub(crate) mod store;
