//! Store error types.

use thiserror::Error;

/// Errors surfaced by a blocking store implementation.
#[derive(Debug, Error)]
pub enum Error {
    /// Record not found.
    #[error("record not found")]
    NotFound,

    /// A uniqueness or referential constraint was violated.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Malformed or unsupported query.
    #[error("query error: {0}")]
    Query(String),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,
}
