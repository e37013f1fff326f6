//! Proxy synchronization: signatures, coverage, per-source state and the engine actor that keeps
//! proxies in step with their sources.

pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod coverage;
pub(crate) mod engine;
pub(crate) mod guard;
pub(crate) mod records;
pub(crate) mod signature;
pub(crate) mod snapshot;
pub(crate) mod state;
pub(crate) mod visibility;
