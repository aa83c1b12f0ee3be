//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent usage errors against the index.
/// Reads never fail; these only come out of mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("item already exists: {0}")]
    DuplicateKey(String),

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("update of {id} changed its identifier to {new_id}")]
    IdChanged { id: String, new_id: String },
}

/// Result type for index mutations.
pub type DomainResult<T> = Result<T, DomainError>;
