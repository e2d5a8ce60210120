//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Storage failure from the Store collaborator. Propagated unmodified;
    /// the current operation aborts with no partial result reported as success.
    #[error("store error: {0}")]
    Store(String),

    /// Referenced category does not exist for the given (user, team).
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    /// Proposed board order does not match the category's current board set.
    /// Raised before any Store mutation is attempted.
    #[error("board set mismatch for category {category_id}: {reason}")]
    BoardSetMismatch { category_id: String, reason: String },
}
