//! On-disk persistence for the honor ledger.
//!
//! Two JSON resources live under the bot's data directory: the balance
//! table (`honor_points.json`, a map of user id → point total) and the
//! audit history (`history.json`, an ordered list of formatted lines).
//! Both are rewritten wholesale on every ledger mutation.

use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

const BALANCES_FILE: &str = "honor_points.json";
const HISTORY_FILE: &str = "history.json";
const STORE_DIR_REL_HOME: &str = ".config/honorbot";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("honor balance file `{}` is corrupt: {}", path.display(), source)]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not access `{}`: {}", path.display(), source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        source: serde_json::Error,
    },
}

/// Reads and writes the two ledger resources within a single directory.
/// The directory is injectable so tests can point at a temporary one.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_dir() -> anyhow::Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(STORE_DIR_REL_HOME))
            .ok_or(anyhow::anyhow!("Could not find home directory"))
    }

    fn balances_path(&self) -> PathBuf {
        self.dir.join(BALANCES_FILE)
    }

    fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    /// A missing balance file means a fresh install and yields an empty
    /// table.  A present but unparseable one is an error; silently
    /// starting over would zero everyone's points.
    pub async fn load_balances(&self) -> Result<HashMap<String, i64>, StoreError> {
        let path = self.balances_path();
        match tokio::fs::read(&path).await {
            Ok(data) => {
                serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt { path, source })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Unlike the balance table, a missing or damaged history file is
    /// discarded and treated as empty.  The audit log is informational;
    /// it should never block startup.
    pub async fn load_history(&self) -> Vec<String> {
        match tokio::fs::read(&self.history_path()).await {
            Ok(data) => serde_json::from_slice(&data).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn save_balances(&self, balances: &HashMap<String, i64>) -> Result<(), StoreError> {
        let serialized =
            serde_json::to_string_pretty(balances).map_err(|source| StoreError::Serialize {
                what: "honor balances",
                source,
            })?;
        self.write_atomic(self.balances_path(), serialized).await
    }

    pub async fn save_history(&self, history: &[String]) -> Result<(), StoreError> {
        let serialized =
            serde_json::to_string_pretty(history).map_err(|source| StoreError::Serialize {
                what: "honor history",
                source,
            })?;
        self.write_atomic(self.history_path(), serialized).await
    }

    /// Write to a sibling temporary file, then atomically rename it over
    /// the target so a crash mid-write cannot leave a truncated resource.
    async fn write_atomic(&self, path: PathBuf, contents: String) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let tmp_path = path.with_extension("json.new");
        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        assert!(store.load_balances().await.unwrap().is_empty());
        assert!(store.load_history().await.is_empty());
    }

    #[tokio::test]
    async fn balances_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let mut balances = HashMap::new();
        balances.insert("111".to_string(), 15_i64);
        balances.insert("222".to_string(), 3_i64);

        store.save_balances(&balances).await.unwrap();
        let reloaded = store.load_balances().await.unwrap();
        assert_eq!(reloaded, balances);
    }

    #[tokio::test]
    async fn history_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let history = vec![
            "2024-01-01 10:00:00 - alice granted 5 points to bob".to_string(),
            "2024-01-02 11:00:00 - staff deducted 2 points from bob".to_string(),
        ];

        store.save_history(&history).await.unwrap();
        assert_eq!(store.load_history().await, history);
    }

    #[tokio::test]
    async fn corrupt_balances_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        tokio::fs::write(dir.path().join(BALANCES_FILE), "not json at all")
            .await
            .unwrap();

        match store.load_balances().await {
            Err(StoreError::Corrupt { .. }) => {}
            other => panic!("expected Corrupt error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn corrupt_history_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        tokio::fs::write(dir.path().join(HISTORY_FILE), "{{{{ garbage")
            .await
            .unwrap();

        assert!(store.load_history().await.is_empty());
    }

    #[tokio::test]
    async fn save_leaves_no_temporary_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        store.save_balances(&HashMap::new()).await.unwrap();
        assert!(dir.path().join(BALANCES_FILE).exists());
        assert!(!dir.path().join("honor_points.json.new").exists());
    }
}
