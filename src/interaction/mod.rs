//! Interaction monitor: pointer gestures in, a watchable "interaction active" signal out.

pub(crate) mod monitor;
