//! JSON file storage implementation.
//!
//! Stores each record as a JSON file under the storage root and keeps small
//! per-record meta markers (version + updated_at). Writes land on disk
//! immediately; the original bytes of every file touched since the last
//! commit are journaled so that `rollback` can put them back.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use goalpace_core::{Goal, GoalFilter, GoalId, Territory, TerritoryId};
use super::trait_::{sort_goals, sort_territories};
use super::{Storage, StorageError, Result};
use tokio::fs;
use tracing::{debug, warn};

const GOALS: &str = "goals";
const TERRITORIES: &str = "territories";

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    /// Content of each touched file as of the last commit, `None` if absent
    journal: HashMap<PathBuf, Option<Vec<u8>>>,
}

impl JsonStorage {
    /// Create storage, creating the data and meta directories if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for kind in [GOALS, TERRITORIES] {
            fs::create_dir_all(root.join(kind)).await?;
            fs::create_dir_all(root.join("meta").join(kind)).await?;
        }
        debug!("Opened JSON storage at {}", root.display());

        Ok(Self {
            root,
            journal: HashMap::new(),
        })
    }

    /// Storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether there are writes since the last commit or rollback.
    pub fn has_pending(&self) -> bool {
        !self.journal.is_empty()
    }

    fn record_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    fn meta_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join("meta").join(kind).join(format!("{}.meta.json", id))
    }

    /// Remember what `path` held before its first write since the last commit.
    async fn journal(&mut self, path: PathBuf) -> Result<()> {
        if self.journal.contains_key(&path) {
            return Ok(());
        }
        let original = match fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        self.journal.insert(path, original);
        Ok(())
    }

    /// Read and increment per-record version, return new version.
    async fn bump_version(&self, kind: &str, id: &str) -> Result<u64> {
        let path = self.meta_path(kind, id);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    /// Current version of a record, 0 if it was never written.
    pub async fn version(&self, kind: &str, id: &str) -> Result<u64> {
        let meta: Option<serde_json::Value> = read_json(&self.meta_path(kind, id)).await?;
        Ok(meta
            .and_then(|m| m.get("version").and_then(|v| v.as_u64()))
            .unwrap_or(0))
    }

    async fn write_record<T: serde::Serialize>(&mut self, kind: &str, id: &str, record: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        let path = self.record_path(kind, id);
        let meta = self.meta_path(kind, id);
        self.journal(path.clone()).await?;
        self.journal(meta).await?;
        fs::write(path, json.as_bytes()).await?;
        let version = self.bump_version(kind, id).await?;
        debug!("Saved {} {} (v{})", kind, id, version);
        Ok(())
    }

    async fn remove_record(&mut self, kind: &str, id: &str) -> Result<bool> {
        let path = self.record_path(kind, id);
        let meta = self.meta_path(kind, id);
        self.journal(path.clone()).await?;
        self.journal(meta.clone()).await?;
        let existed = remove_if_exists(&path).await?;
        remove_if_exists(&meta).await?;
        if existed {
            debug!("Deleted {} {}", kind, id);
        }
        Ok(existed)
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_goal(&mut self, goal: &Goal) -> Result<()> {
        self.write_record(GOALS, &goal.id.to_string(), goal).await
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        let path = self.record_path(GOALS, &id.to_string());
        let goal: Option<Goal> = read_json(&path).await?;
        match goal {
            Some(g) if g.id != id => Err(StorageError::Corrupt {
                path: path.display().to_string(),
                reason: format!("holds goal {}", g.id),
            }),
            other => Ok(other),
        }
    }

    async fn list_goals(&self, filter: &GoalFilter) -> Result<Vec<Goal>> {
        let mut goals: Vec<Goal> = list_dir(&self.root.join(GOALS), |g: &Goal| g.id.to_string())
            .await?
            .into_iter()
            .filter(|g| filter.matches(g))
            .collect();
        sort_goals(&mut goals);
        Ok(goals)
    }

    async fn delete_goal(&mut self, id: GoalId) -> Result<bool> {
        self.remove_record(GOALS, &id.to_string()).await
    }

    async fn save_territory(&mut self, territory: &Territory) -> Result<()> {
        self.write_record(TERRITORIES, &territory.id.to_string(), territory).await
    }

    async fn load_territory(&self, id: TerritoryId) -> Result<Option<Territory>> {
        let path = self.record_path(TERRITORIES, &id.to_string());
        let territory: Option<Territory> = read_json(&path).await?;
        match territory {
            Some(t) if t.id != id => Err(StorageError::Corrupt {
                path: path.display().to_string(),
                reason: format!("holds territory {}", t.id),
            }),
            other => Ok(other),
        }
    }

    async fn list_territories(&self) -> Result<Vec<Territory>> {
        let mut territories: Vec<Territory> =
            list_dir(&self.root.join(TERRITORIES), |t: &Territory| t.id.to_string()).await?;
        sort_territories(&mut territories);
        Ok(territories)
    }

    async fn delete_territory(&mut self, id: TerritoryId) -> Result<bool> {
        self.remove_record(TERRITORIES, &id.to_string()).await
    }

    async fn commit(&mut self, message: &str) -> Result<()> {
        debug!("Commit ({} files): {}", self.journal.len(), message);
        self.journal.clear();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let journal = std::mem::take(&mut self.journal);
        let restored = journal.len();
        for (path, original) in journal {
            match original {
                Some(bytes) => fs::write(&path, bytes).await?,
                None => {
                    remove_if_exists(&path).await?;
                }
            }
        }
        debug!("Rolled back {} files", restored);
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read every record in `dir`, skipping files whose name does not match the id inside.
async fn list_dir<T, F>(dir: &Path, id_of: F) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    F: Fn(&T) -> String,
{
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&path).await {
            Ok(Some(item)) => {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                let id = id_of(&item);
                if id == stem {
                    items.push(item);
                } else {
                    warn!("Skipping {}: holds record {}", path.display(), id);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
        }
    }
    Ok(items)
}

async fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
