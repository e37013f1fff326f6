//! Shared primitives: error taxonomy, identifiers and colors, hashing and PRNG helpers.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
