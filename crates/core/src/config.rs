//! Runtime configuration.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::policy::PolicyKind;

/// Goalpace configuration, loaded from a JSON file.
///
/// Missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalpaceConfig {
    /// Status policy applied by every progress consumer
    pub policy: PolicyKind,

    /// Sample spacing for forecast series, in days
    pub forecast_step_days: u32,

    /// Directory for the JSON store
    pub storage_path: PathBuf,
}

impl Default for GoalpaceConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            forecast_step_days: 7,
            storage_path: PathBuf::from(".goalpace"),
        }
    }
}

impl GoalpaceConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        if config.forecast_step_days == 0 {
            return Err(CoreError::validation("forecast_step_days", "must be at least 1"));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DeadlinePolicy;

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goalpace.json");
        std::fs::write(&path, r#"{"policy":{"kind":"deadline","urgent_days":3}}"#).unwrap();

        let config = GoalpaceConfig::load(&path).unwrap();
        assert_eq!(
            config.policy,
            PolicyKind::Deadline(DeadlinePolicy { healthy_at: 70.0, urgent_days: 3 })
        );
        assert_eq!(config.forecast_step_days, 7);
        assert_eq!(config.storage_path, PathBuf::from(".goalpace"));
    }

    #[test]
    fn test_load_rejects_zero_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goalpace.json");
        std::fs::write(&path, r#"{"forecast_step_days":0}"#).unwrap();
        assert!(matches!(
            GoalpaceConfig::load(&path),
            Err(CoreError::Validation { field: "forecast_step_days", .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            GoalpaceConfig::load(dir.path().join("nope.json")),
            Err(CoreError::Io(_))
        ));
    }
}
