//! Error types for transition orchestration.

use thiserror::Error;

use crate::element::ElementId;

/// Convenience result alias used across the workspace.
pub type Result<T> = std::result::Result<T, UsageError>;

/// Errors raised by invalid use of the public API.
///
/// These indicate programming errors on the embedder's side, not runtime
/// conditions; nothing here is retried or recovered internally. Strict
/// entry points return them, lenient event paths log and continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// A keyed child list contained the same key more than once.
    #[error("duplicate child key `{key}`")]
    DuplicateKey { key: String },

    /// A keyed child list contained an empty key.
    #[error("child at index {index} has an empty key")]
    EmptyKey { index: usize },

    /// `mount` was called while a different element is already bound.
    #[error("element {current} is already bound; unmount it first")]
    AlreadyBound { current: ElementId },
}
