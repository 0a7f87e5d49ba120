//! Repository Module
//!
//! Provides the ledger operations over SQLite. Expected contention
//! outcomes (another writer won the slot) are values on the operation
//! results, never errors; `RepoError` is reserved for real failures.

pub mod reservation;
pub mod restaurant;
pub mod slot;

// Re-exports
pub use reservation::{
    CancelOutcome, CommitOutcome, NewReservation, ReservationRepository,
};
pub use restaurant::RestaurantRepository;
pub use slot::SlotRepository;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".to_string()),
            e => RepoError::Database(e.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
