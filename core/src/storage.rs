use crate::error::{Error, TribunalResult};
use crate::store::MemoryStore;
use std::path::{Path, PathBuf};

const SNAPSHOT_FILE: &str = "state.bin";

/// On-disk snapshots of a [`MemoryStore`].
pub struct SnapshotStorage {
    data_dir: PathBuf,
}

impl SnapshotStorage {
    pub fn new() -> TribunalResult<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| Error::Storage("Cannot determine data directory".to_string()))?
            .join("tribunal");

        Self::with_path(data_dir)
    }

    pub fn with_path(data_dir: PathBuf) -> TribunalResult<Self> {
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| Error::Storage(format!("Failed to create data directory: {}", e)))?;

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    pub fn save(&self, store: &MemoryStore) -> TribunalResult<()> {
        let bytes = store.encode()?;

        std::fs::write(self.snapshot_path(), &bytes)
            .map_err(|e| Error::Storage(format!("Failed to write snapshot: {}", e)))?;

        tracing::debug!(path = %self.snapshot_path().display(), bytes = bytes.len(), "Snapshot saved");
        Ok(())
    }

    pub fn load(&self) -> TribunalResult<MemoryStore> {
        let path = self.snapshot_path();

        if !path.exists() {
            return Err(Error::Storage("No stored snapshot found".to_string()));
        }

        let bytes = std::fs::read(&path)
            .map_err(|e| Error::Storage(format!("Failed to read snapshot: {}", e)))?;

        MemoryStore::decode(&bytes)
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot_path().exists()
    }

    pub fn load_or_default(&self) -> TribunalResult<MemoryStore> {
        if self.has_snapshot() {
            self.load()
        } else {
            Ok(MemoryStore::new())
        }
    }

    pub fn delete(&self) -> TribunalResult<()> {
        let path = self.snapshot_path();

        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| Error::Storage(format!("Failed to delete snapshot: {}", e)))?;
        }

        Ok(())
    }

    pub fn export_json(&self, store: &MemoryStore, path: &Path) -> TribunalResult<()> {
        let json = serde_json::to_string_pretty(store)?;

        std::fs::write(path, json)
            .map_err(|e| Error::Storage(format!("Failed to write file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModerationConfig;
    use crate::content::submit_content;
    use crate::reputation::stake;
    use crate::types::ParticipantId;
    use tempfile::tempdir;

    fn populated() -> MemoryStore {
        let mut store = MemoryStore::new();
        let config = ModerationConfig::default();
        stake(&mut store, &config, &ParticipantId::from("alice"), 1000).unwrap();
        submit_content(&mut store, &ParticipantId::from("alice"), b"hash", 3).unwrap();
        store
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().expect("Failed to create temp dir");
        let storage =
            SnapshotStorage::with_path(dir.path().to_path_buf()).expect("Failed to create storage");
        let store = populated();

        storage.save(&store).expect("Failed to save snapshot");
        assert!(storage.has_snapshot());

        let loaded = storage.load().expect("Failed to load snapshot");
        assert_eq!(loaded, store);
        assert_eq!(loaded.state_digest().unwrap(), store.state_digest().unwrap());
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempdir().expect("Failed to create temp dir");
        let storage =
            SnapshotStorage::with_path(dir.path().to_path_buf()).expect("Failed to create storage");

        assert!(!storage.has_snapshot());
        assert!(matches!(storage.load(), Err(Error::Storage(_))));

        let store = storage.load_or_default().expect("Failed to load default");
        assert_eq!(store, MemoryStore::new());
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().expect("Failed to create temp dir");
        let storage =
            SnapshotStorage::with_path(dir.path().to_path_buf()).expect("Failed to create storage");

        storage.save(&populated()).expect("Failed to save snapshot");
        storage.delete().expect("Failed to delete snapshot");

        assert!(!storage.has_snapshot());
    }

    #[test]
    fn test_export_json() {
        let dir = tempdir().expect("Failed to create temp dir");
        let storage =
            SnapshotStorage::with_path(dir.path().to_path_buf()).expect("Failed to create storage");

        let export_path = dir.path().join("state.json");
        storage
            .export_json(&populated(), &export_path)
            .expect("Failed to export");

        let json = std::fs::read_to_string(&export_path).unwrap();
        assert!(json.contains("\"alice\""));
        assert!(json.contains("\"pending\""));
    }
}
