//! Learned-facts snapshot on disk
//!
//! A flat JSON object with keys sorted, so successive saves diff cleanly.
//! Loading never fails: a missing or malformed file yields defaults.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Pending price identification for one on-screen item name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceIdRecord {
    /// Label typed into the call prompt
    pub short_name: String,
    pub candidates: Vec<String>,
    /// Label has been typed into the game
    pub item_called: bool,
}

/// Everything the monitor carries between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub price_id: BTreeMap<String, PriceIdRecord>,
    /// On-screen appearance name to confirmed identity
    pub known_items: BTreeMap<String, String>,
    pub charisma: u32,
    pub xplevel: u32,
    pub sucker: bool,
    pub tourist: bool,
}

/// JSON snapshot file at a fixed path
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    path: PathBuf,
}

impl PersistenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot, falling back to defaults
    #[must_use]
    pub fn load(&self) -> Snapshot {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::debug!(path = %self.path.display(), error = %e, "Snapshot unreadable, using defaults");
                }
                return Snapshot::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Snapshot malformed, using defaults");
            Snapshot::default()
        })
    }

    /// Write the snapshot through a sibling temp file
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| PersistenceError::Encode(e.to_string()))?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                if let Err(cleanup) = fs::remove_file(&tmp) {
                    tracing::debug!(path = %tmp.display(), error = %cleanup, "Temp snapshot not removed");
                }
                self.classify(&e)
            })
    }

    /// Delete the snapshot; a missing file is fine
    pub fn remove(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.classify(&e)),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn classify(&self, e: &io::Error) -> PersistenceError {
        let path = self.path.display().to_string();
        let reason = e.to_string();
        match e.kind() {
            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                PersistenceError::Transient { path, reason }
            }
            _ => PersistenceError::Unwritable { path, reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot {
            charisma: 16,
            xplevel: 3,
            tourist: true,
            sucker: true,
            ..Snapshot::default()
        };
        snapshot.price_id.insert(
            "bubbly potion".to_string(),
            PriceIdRecord {
                short_name: "ExtraHeal/FullHeal".to_string(),
                candidates: vec![
                    "potion of extra healing".to_string(),
                    "potion of full healing".to_string(),
                ],
                item_called: false,
            },
        );
        snapshot
            .known_items
            .insert("oak wand".to_string(), "wand of wishing".to_string());
        snapshot
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("nha.json"));
        assert_eq!(store.load(), Snapshot::default());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nha.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(PersistenceStore::new(&path).load(), Snapshot::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("nha.json"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load(), sample());
        assert!(!dir.path().join("nha.json.tmp").exists());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nha.json");
        fs::write(&path, r#"{"charisma": 12, "future_field": [1, 2]}"#).unwrap();
        let snapshot = PersistenceStore::new(&path).load();
        assert_eq!(snapshot.charisma, 12);
        assert!(snapshot.price_id.is_empty());
        assert!(!snapshot.sucker);
    }

    #[test]
    fn saved_keys_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nha.json");
        let mut snapshot = sample();
        snapshot
            .known_items
            .insert("birch wand".to_string(), "wand of light".to_string());
        PersistenceStore::new(&path).save(&snapshot).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let birch = text.find("birch wand").unwrap();
        let oak = text.find("oak wand").unwrap();
        assert!(birch < oak);
    }

    #[test]
    fn unwritable_directory_disables() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("missing").join("nha.json"));
        let err = store.save(&sample()).unwrap_err();
        assert!(!err.is_transient());
        assert!(matches!(err, PersistenceError::Unwritable { .. }));
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nha.json");
        fs::create_dir(&path).unwrap();
        let store = PersistenceStore::new(&path);

        let err = store.save(&sample()).unwrap_err();
        assert!(!err.is_transient());
        assert!(!dir.path().join("nha.json.tmp").exists());
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("nha.json"));
        store.remove().unwrap();
        store.save(&Snapshot::default()).unwrap();
        store.remove().unwrap();
        assert!(!store.path().exists());
    }
}
