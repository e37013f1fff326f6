use std::time::Duration;

use crate::foundation::core::ShapeId;

/// Convenience result type used across fxproxy.
pub type FxResult<T> = Result<T, FxError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Export, decode, timeout and store failures are all recoverable: the engine keeps the affected
/// source dirty and retries on a later pass. See [`FxError::is_recoverable`].
#[derive(thiserror::Error, Debug)]
pub enum FxError {
    /// Invalid configuration or effect parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// The vector description of a shape was unavailable or empty.
    #[error("export error: {0}")]
    Export(String),

    /// Image decode failed or produced a surface without visible content.
    #[error("decode error: {0}")]
    Decode(String),

    /// A render exceeded its time budget.
    #[error("render timed out after {0:?}")]
    Timeout(Duration),

    /// The document store rejected a read or a patch.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Engine lifecycle misuse, e.g. talking to an uninstalled engine.
    #[error("engine error: {0}")]
    Engine(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FxError {
    /// Build a [`FxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FxError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`FxError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`FxError::Engine`] value.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Whether the engine should keep the source dirty and retry later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Export(_) | Self::Decode(_) | Self::Timeout(_) | Self::Store(_)
        )
    }
}

/// Errors reported by a [`crate::DocumentStore`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The shape does not exist.
    #[error("shape '{0}' not found")]
    NotFound(ShapeId),

    /// The shape is locked and cannot be patched.
    #[error("shape '{0}' is locked")]
    Locked(ShapeId),

    /// The store refused the patch for another reason.
    #[error("patch rejected: {0}")]
    Rejected(String),
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
