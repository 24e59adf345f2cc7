//! # Error Handling
//!
//! Typed errors for the repository layer and the metrics engine. The engine
//! never surfaces an error to an end user: missing graph data degrades to a
//! truncated traversal, and per-record failures are logged and skipped.

use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("record not found: {0}")]
    NotFound(String),
}

impl RepositoryError {
    pub fn database_error(err: DbErr) -> Self {
        RepositoryError::Database(err)
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        RepositoryError::NotFound(what.into())
    }
}

/// Errors produced by the metrics engine passes.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}
