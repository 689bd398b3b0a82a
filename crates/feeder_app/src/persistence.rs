use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use feeder_core::CompletedItemSnapshot;
use feeder_engine::{AtomicFileWriter, CompletionStore, ItemKey};
use feeder_logging::{feeder_error, feeder_info, feeder_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".feeder_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedMarker {
    key: ItemKey,
    url: String,
    completed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    completed: Vec<PersistedMarker>,
}

/// RON-file-backed completion markers. Each successful item is written back
/// immediately, so a crash mid-batch loses at most the in-flight item.
pub struct MarkerStore {
    state_dir: PathBuf,
    completed: Mutex<BTreeMap<ItemKey, PersistedMarker>>,
}

impl MarkerStore {
    /// Loads markers from the state file; missing or corrupt state starts
    /// empty with a warning rather than failing startup.
    pub fn load(state_dir: &Path) -> Self {
        let path = state_dir.join(STATE_FILENAME);
        let completed = match std::fs::read_to_string(&path) {
            Ok(content) => match ron::from_str::<PersistedState>(&content) {
                Ok(state) => {
                    feeder_info!("Loaded {} completion markers from {:?}", state.completed.len(), path);
                    state
                        .completed
                        .into_iter()
                        .map(|marker| (marker.key, marker))
                        .collect()
                }
                Err(err) => {
                    feeder_warn!("Failed to parse state from {:?}: {}", path, err);
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                feeder_warn!("Failed to read state from {:?}: {}", path, err);
                BTreeMap::new()
            }
        };

        Self {
            state_dir: state_dir.to_path_buf(),
            completed: Mutex::new(completed),
        }
    }

    /// Snapshot for restoring the core's completed set at startup.
    pub fn completed_snapshot(&self) -> Vec<CompletedItemSnapshot> {
        self.completed
            .lock()
            .expect("lock marker state")
            .values()
            .map(|marker| CompletedItemSnapshot {
                key: marker.key,
                url: marker.url.clone(),
            })
            .collect()
    }

    fn save_locked(&self, completed: &BTreeMap<ItemKey, PersistedMarker>) {
        let state = PersistedState {
            completed: completed.values().cloned().collect(),
        };
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(&state, pretty) {
            Ok(text) => text,
            Err(err) => {
                feeder_error!("Failed to serialize marker state: {}", err);
                return;
            }
        };

        let writer = AtomicFileWriter::new(self.state_dir.clone());
        if let Err(err) = writer.write(STATE_FILENAME, &content) {
            feeder_error!("Failed to write marker state to {:?}: {}", self.state_dir, err);
        }
    }
}

impl CompletionStore for MarkerStore {
    fn is_completed(&self, key: ItemKey) -> bool {
        self.completed
            .lock()
            .expect("lock marker state")
            .contains_key(&key)
    }

    fn mark_completed(&self, key: ItemKey, url: &str) {
        let mut completed = self.completed.lock().expect("lock marker state");
        completed.insert(
            key,
            PersistedMarker {
                key,
                url: url.to_string(),
                completed_at: Utc::now().to_rfc3339(),
            },
        );
        self.save_locked(&completed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn markers_survive_a_reload() {
        let temp = TempDir::new().unwrap();
        let store = MarkerStore::load(temp.path());
        assert!(!store.is_completed(0));

        store.mark_completed(0, "https://a.test");
        store.mark_completed(3, "https://b.test");

        let reloaded = MarkerStore::load(temp.path());
        assert!(reloaded.is_completed(0));
        assert!(reloaded.is_completed(3));
        assert!(!reloaded.is_completed(1));

        let snapshot = reloaded.completed_snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].url, "https://a.test");
    }

    #[test]
    fn corrupt_state_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(STATE_FILENAME), "not ron at all").unwrap();

        let store = MarkerStore::load(temp.path());
        assert!(store.completed_snapshot().is_empty());
    }

    #[test]
    fn missing_state_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let store = MarkerStore::load(temp.path());
        assert!(store.completed_snapshot().is_empty());
    }
}
