//! Goal and territory management service.
//!
//! All writes go through here so that creation-time invariants are checked
//! before a record reaches the store.

use goalpace_core::{
    Goal, GoalFilter, GoalId, GoalUpdate, NewGoal, NewTerritory, Territory, TerritoryId,
    TerritoryUpdate,
};
use goalpace_storage::{Storage, StorageError};
use tracing::{debug, info, warn};
use crate::error::{ManagerError, Result};

/// Validating front for a [`Storage`] backend.
pub struct GoalManager<S: Storage> {
    storage: S,
}

impl<S: Storage> GoalManager<S> {
    /// Create a new manager over a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Borrow the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give back the underlying storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    // === Goals ===

    /// Validate and store a new goal.
    pub async fn create_goal(&mut self, new: NewGoal) -> Result<Goal> {
        let goal = Goal::new(new);
        goal.validate()?;
        if let Some(territory) = goal.territory_id {
            self.require_territory(territory).await?;
        }

        if let Err(e) = self.storage.save_goal(&goal).await {
            return Err(self.abandon(e).await);
        }
        self.storage.commit(&format!("Create goal {}", goal.id)).await?;
        info!("Created goal {} '{}'", goal.id, goal.title);
        Ok(goal)
    }

    /// Load a goal or fail with `NotFound`.
    pub async fn get_goal(&self, id: GoalId) -> Result<Goal> {
        self.storage
            .load_goal(id)
            .await?
            .ok_or_else(|| ManagerError::not_found("Goal", id))
    }

    /// List goals matching a filter.
    pub async fn list_goals(&self, filter: &GoalFilter) -> Result<Vec<Goal>> {
        Ok(self.storage.list_goals(filter).await?)
    }

    /// Merge a partial update into a goal and re-validate it.
    pub async fn update_goal(&mut self, id: GoalId, update: GoalUpdate) -> Result<Goal> {
        let mut goal = self.get_goal(id).await?;
        let territory_changed = matches!(update.territory_id, Some(Some(_)));

        goal.apply(update);
        goal.validate()?;
        if territory_changed {
            if let Some(territory) = goal.territory_id {
                self.require_territory(territory).await?;
            }
        }

        if let Err(e) = self.storage.save_goal(&goal).await {
            return Err(self.abandon(e).await);
        }
        self.storage.commit(&format!("Update goal {}", goal.id)).await?;
        debug!("Updated goal {}", goal.id);
        Ok(goal)
    }

    /// Set a goal's current value.
    pub async fn record_progress(&mut self, id: GoalId, value: f64) -> Result<Goal> {
        let goal = self
            .update_goal(id, GoalUpdate { current_value: Some(value), ..Default::default() })
            .await?;
        info!("Recorded {} on goal {}", value, id);
        Ok(goal)
    }

    /// Delete a goal.
    pub async fn delete_goal(&mut self, id: GoalId) -> Result<()> {
        let existed = match self.storage.delete_goal(id).await {
            Ok(existed) => existed,
            Err(e) => return Err(self.abandon(e).await),
        };
        if !existed {
            return Err(ManagerError::not_found("Goal", id));
        }
        self.storage.commit(&format!("Delete goal {}", id)).await?;
        info!("Deleted goal {}", id);
        Ok(())
    }

    // === Territories ===

    /// Validate and store a new territory.
    pub async fn create_territory(&mut self, new: NewTerritory) -> Result<Territory> {
        let territory = Territory::new(new);
        territory.validate()?;

        if let Err(e) = self.storage.save_territory(&territory).await {
            return Err(self.abandon(e).await);
        }
        self.storage.commit(&format!("Create territory {}", territory.id)).await?;
        info!("Created territory {} '{}'", territory.id, territory.name);
        Ok(territory)
    }

    /// Load a territory or fail with `NotFound`.
    pub async fn get_territory(&self, id: TerritoryId) -> Result<Territory> {
        self.storage
            .load_territory(id)
            .await?
            .ok_or_else(|| ManagerError::not_found("Territory", id))
    }

    /// List all territories.
    pub async fn list_territories(&self) -> Result<Vec<Territory>> {
        Ok(self.storage.list_territories().await?)
    }

    /// Merge a partial update into a territory.
    pub async fn update_territory(&mut self, id: TerritoryId, update: TerritoryUpdate) -> Result<Territory> {
        let mut territory = self.get_territory(id).await?;
        territory.apply(update);
        territory.validate()?;

        if let Err(e) = self.storage.save_territory(&territory).await {
            return Err(self.abandon(e).await);
        }
        self.storage.commit(&format!("Update territory {}", id)).await?;
        Ok(territory)
    }

    /// Delete a territory that no goal references.
    pub async fn delete_territory(&mut self, id: TerritoryId) -> Result<()> {
        let assigned = self
            .storage
            .list_goals(&GoalFilter { territory_id: Some(id), ..Default::default() })
            .await?
            .len();
        if assigned > 0 {
            return Err(ManagerError::InUse { id, goals: assigned });
        }

        let existed = match self.storage.delete_territory(id).await {
            Ok(existed) => existed,
            Err(e) => return Err(self.abandon(e).await),
        };
        if !existed {
            return Err(ManagerError::not_found("Territory", id));
        }
        self.storage.commit(&format!("Delete territory {}", id)).await?;
        info!("Deleted territory {}", id);
        Ok(())
    }

    async fn require_territory(&self, id: TerritoryId) -> Result<()> {
        self.get_territory(id).await.map(|_| ())
    }

    /// Roll back a half-applied write and hand back its error.
    async fn abandon(&mut self, err: StorageError) -> ManagerError {
        if let Err(e) = self.storage.rollback().await {
            warn!("Rollback after failed write also failed: {}", e);
        }
        err.into()
    }
}
