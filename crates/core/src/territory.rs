//! Territory model - a sales region that goals can be assigned to.

use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::id::TerritoryId;
use crate::Time;

/// A sales territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    /// Unique identifier
    pub id: TerritoryId,

    /// Territory name
    pub name: String,

    /// Region label (e.g. "EMEA", "Northeast")
    #[serde(default)]
    pub region: String,

    /// Responsible manager
    #[serde(default)]
    pub manager: Option<String>,

    /// Free-form notes
    #[serde(default)]
    pub description: String,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

impl Territory {
    /// Create a territory from a creation payload.
    pub fn new(new: NewTerritory) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: TerritoryId::new(),
            name: new.name,
            region: new.region,
            manager: new.manager,
            description: new.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the creation-time invariants.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("name", "must not be blank"));
        }
        Ok(())
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: TerritoryUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(region) = update.region {
            self.region = region;
        }
        if let Some(manager) = update.manager {
            self.manager = manager;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        self.updated_at = chrono::Utc::now();
    }
}

/// Payload for creating a territory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTerritory {
    /// Territory name
    pub name: String,
    /// Region label
    #[serde(default)]
    pub region: String,
    /// Responsible manager
    #[serde(default)]
    pub manager: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub description: String,
}

/// Partial update for a territory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerritoryUpdate {
    /// New name
    pub name: Option<String>,
    /// New region
    pub region: Option<String>,
    /// `Some(None)` clears the manager
    pub manager: Option<Option<String>>,
    /// New notes
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        let territory = Territory::new(NewTerritory {
            name: " ".to_string(),
            ..Default::default()
        });
        assert!(territory.validate().is_err());
    }

    #[test]
    fn test_apply_clears_manager() {
        let mut territory = Territory::new(NewTerritory {
            name: "West".to_string(),
            manager: Some("Dana".to_string()),
            ..Default::default()
        });
        territory.apply(TerritoryUpdate {
            manager: Some(None),
            ..Default::default()
        });
        assert_eq!(territory.manager, None);
        assert_eq!(territory.name, "West");
    }
}
