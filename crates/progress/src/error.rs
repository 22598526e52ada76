//! Errors for goal and territory management.

use goalpace_core::{CoreError, TerritoryId};
use goalpace_storage::StorageError;

/// Error type for manager operations.
pub type Result<T> = std::result::Result<T, ManagerError>;

/// Errors that can occur while managing goals and territories.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// Record failed validation
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// Backend failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No record with this id
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind
        kind: &'static str,
        /// Requested id
        id: String,
    },

    /// Territory still has goals assigned
    #[error("Territory {id} is still assigned to {goals} goal(s)")]
    InUse {
        /// Territory id
        id: TerritoryId,
        /// Number of goals referencing it
        goals: usize,
    },
}

impl ManagerError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound { kind, id: id.to_string() }
    }
}
