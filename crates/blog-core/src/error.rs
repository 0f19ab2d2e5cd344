//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business rule failures raised before touching storage.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Lookup keys are ids, slugs or usernames, so the key is kept as text.
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Already taken: {0}")]
    Duplicate(String),

    #[error("Staff access required")]
    StaffOnly,
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    /// Also returned for a page number past the end of a feed.
    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
