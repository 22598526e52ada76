//! Storage trait abstraction.

use async_trait::async_trait;
use goalpace_core::{Goal, GoalFilter, GoalId, Territory, TerritoryId};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored file does not hold the record its name says it does
    #[error("Corrupt record {path}: {reason}")]
    Corrupt {
        /// File that failed the check
        path: String,
        /// What was wrong
        reason: String,
    },
}

/// Repository interface for goals and territories.
///
/// Records are addressed by opaque id only. This trait allows different
/// storage backends to be plugged in.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Goal operations ===

    /// Save a goal (create or update).
    async fn save_goal(&mut self, goal: &Goal) -> Result<()>;

    /// Load a goal by ID.
    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>>;

    /// List goals matching the filter, ordered by start date then id.
    async fn list_goals(&self, filter: &GoalFilter) -> Result<Vec<Goal>>;

    /// Delete a goal. Returns whether it existed.
    async fn delete_goal(&mut self, id: GoalId) -> Result<bool>;

    // === Territory operations ===

    /// Save a territory (create or update).
    async fn save_territory(&mut self, territory: &Territory) -> Result<()>;

    /// Load a territory by ID.
    async fn load_territory(&self, id: TerritoryId) -> Result<Option<Territory>>;

    /// List all territories, ordered by name.
    async fn list_territories(&self) -> Result<Vec<Territory>>;

    /// Delete a territory. Returns whether it existed.
    async fn delete_territory(&mut self, id: TerritoryId) -> Result<bool>;

    // === Transaction support ===

    /// Settle every write since the previous commit.
    async fn commit(&mut self, message: &str) -> Result<()>;

    /// Restore the store to its state at the previous commit.
    async fn rollback(&mut self) -> Result<()>;
}

/// Order goals the way every backend returns them.
pub(crate) fn sort_goals(goals: &mut [Goal]) {
    goals.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
}

/// Order territories the way every backend returns them.
pub(crate) fn sort_territories(territories: &mut [Territory]) {
    territories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}
