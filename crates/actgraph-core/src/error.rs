//! Error types for the graph store

use crate::types::{ConnectionKey, NodeKey};

/// Store-level failures.
///
/// All of these are input-validation failures: the offending operation is skipped and
/// the store is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Activity id absent or not an integer
    #[error("activity id missing or not an integer")]
    InvalidActivityId,

    /// Referenced node key is not in the store
    #[error("missing node: {0}")]
    MissingNode(NodeKey),

    /// Referenced connection key is not in the store
    #[error("missing connection: {0}")]
    MissingConnection(ConnectionKey),

    /// No change entry recorded for the key
    #[error("no change recorded for key {0}")]
    MissingChange(String),
}

impl StoreError {
    /// Key the error refers to, if any
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match self {
            StoreError::InvalidActivityId => None,
            StoreError::MissingNode(key) => Some(key.to_string()),
            StoreError::MissingConnection(key) => Some(key.to_string()),
            StoreError::MissingChange(key) => Some(key.clone()),
        }
    }

    /// Whether the build can continue past this failure
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::InvalidActivityId
            | StoreError::MissingNode(_)
            | StoreError::MissingConnection(_) => true,
            StoreError::MissingChange(_) => false,
        }
    }
}
