//! In-memory storage backend.

use std::collections::HashMap;
use goalpace_core::{Goal, GoalFilter, GoalId, Territory, TerritoryId};
use super::trait_::{sort_goals, sort_territories};
use super::{Storage, Result};

#[derive(Debug, Default, Clone)]
struct Tables {
    goals: HashMap<GoalId, Goal>,
    territories: HashMap<TerritoryId, Territory>,
}

/// Storage held entirely in memory. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    tables: Tables,
    /// Tables as of the last commit, taken on the first write after it
    checkpoint: Option<Tables>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether there are writes since the last commit or rollback.
    pub fn has_pending(&self) -> bool {
        self.checkpoint.is_some()
    }

    fn touch(&mut self) -> &mut Tables {
        if self.checkpoint.is_none() {
            self.checkpoint = Some(self.tables.clone());
        }
        &mut self.tables
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_goal(&mut self, goal: &Goal) -> Result<()> {
        self.touch().goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        Ok(self.tables.goals.get(&id).cloned())
    }

    async fn list_goals(&self, filter: &GoalFilter) -> Result<Vec<Goal>> {
        let mut goals: Vec<Goal> = self
            .tables
            .goals
            .values()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect();
        sort_goals(&mut goals);
        Ok(goals)
    }

    async fn delete_goal(&mut self, id: GoalId) -> Result<bool> {
        Ok(self.touch().goals.remove(&id).is_some())
    }

    async fn save_territory(&mut self, territory: &Territory) -> Result<()> {
        self.touch().territories.insert(territory.id, territory.clone());
        Ok(())
    }

    async fn load_territory(&self, id: TerritoryId) -> Result<Option<Territory>> {
        Ok(self.tables.territories.get(&id).cloned())
    }

    async fn list_territories(&self) -> Result<Vec<Territory>> {
        let mut territories: Vec<Territory> = self.tables.territories.values().cloned().collect();
        sort_territories(&mut territories);
        Ok(territories)
    }

    async fn delete_territory(&mut self, id: TerritoryId) -> Result<bool> {
        Ok(self.touch().territories.remove(&id).is_some())
    }

    async fn commit(&mut self, _message: &str) -> Result<()> {
        self.checkpoint = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if let Some(tables) = self.checkpoint.take() {
            self.tables = tables;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use goalpace_core::{NewGoal, NewTerritory, TerritoryUpdate};

    fn deals_goal() -> Goal {
        Goal::new(NewGoal {
            title: "Deals".to_string(),
            description: String::new(),
            metric: goalpace_core::GoalMetric::Deals,
            period: goalpace_core::GoalPeriod::Monthly,
            target_value: 12.0,
            current_value: 3.0,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            territory_id: None,
        })
    }

    fn territory(name: &str) -> Territory {
        Territory::new(NewTerritory { name: name.to_string(), ..Default::default() })
    }

    #[tokio::test]
    async fn test_crud_by_id() {
        let mut storage = MemoryStorage::new();
        let goal = deals_goal();

        storage.save_goal(&goal).await.unwrap();
        assert_eq!(storage.load_goal(goal.id).await.unwrap(), Some(goal.clone()));
        assert_eq!(storage.list_goals(&GoalFilter::default()).await.unwrap().len(), 1);

        assert!(storage.delete_goal(goal.id).await.unwrap());
        assert!(storage.load_goal(goal.id).await.unwrap().is_none());
        assert!(!storage.delete_goal(goal.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_territory_crud() {
        let mut storage = MemoryStorage::new();
        let west = territory("West");
        let east = territory("East");
        storage.save_territory(&west).await.unwrap();
        storage.save_territory(&east).await.unwrap();

        let names: Vec<_> = storage
            .list_territories()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["East", "West"]);

        let mut renamed = west.clone();
        renamed.apply(TerritoryUpdate { name: Some("Pacific".to_string()), ..Default::default() });
        storage.save_territory(&renamed).await.unwrap();
        assert_eq!(storage.load_territory(west.id).await.unwrap().unwrap().name, "Pacific");

        assert!(storage.delete_territory(east.id).await.unwrap());
        assert!(!storage.delete_territory(east.id).await.unwrap());
        assert!(storage.load_territory(east.id).await.unwrap().is_none());
        assert_eq!(storage.list_territories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_restores_last_commit() {
        let mut storage = MemoryStorage::new();
        let kept = deals_goal();
        storage.save_goal(&kept).await.unwrap();
        storage.commit("add kept").await.unwrap();
        assert!(!storage.has_pending());

        let west = territory("West");
        storage.save_territory(&west).await.unwrap();
        storage.delete_goal(kept.id).await.unwrap();
        assert!(storage.has_pending());

        storage.rollback().await.unwrap();
        assert!(!storage.has_pending());
        assert_eq!(storage.load_goal(kept.id).await.unwrap(), Some(kept));
        assert!(storage.load_territory(west.id).await.unwrap().is_none());
    }
}
