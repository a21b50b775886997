//! Error types for the timer store

use thiserror::Error;

use crate::storage::StorageError;

/// Rejected user input. Raised before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name, duration and category are required")]
    MissingFields,

    #[error("duration must be greater than zero, got {0}")]
    NonPositiveDuration(i64),

    #[error("duration of {0} seconds is too large")]
    DurationTooLarge(i64),
}

/// Failure of a store command.
///
/// `Storage` means the in-memory change was applied but could not be saved.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist {collection}: {source}")]
    Storage {
        collection: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("failed to lock timer state: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    /// True when the command took effect in memory and only durability failed
    pub fn is_unsaved(&self) -> bool {
        matches!(self, StoreError::Storage { .. })
    }
}
