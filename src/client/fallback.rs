use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::traits::FallbackStore;
use crate::error::Error;
use crate::types::SessionId;

/// Fallback file name
pub const FALLBACK_FILE: &str = "admin-session.json";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FallbackFile {
    session_id: SessionId,
}

/// Fallback session id persisted as JSON on disk.
pub struct FileFallbackStore {
    path: PathBuf,
}

impl FileFallbackStore {
    /// Store the fallback in `dir/admin-session.json`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(FALLBACK_FILE),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl FallbackStore for FileFallbackStore {
    fn load(&self) -> Result<Option<SessionId>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Storage(format!("read {}: {e}", self.path.display())))?;
        let file: FallbackFile = serde_json::from_str(&contents)
            .map_err(|e| Error::Storage(format!("parse {}: {e}", self.path.display())))?;
        Ok(Some(file.session_id))
    }

    fn save(&mut self, session_id: &SessionId) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }
        let contents = serde_json::to_string_pretty(&FallbackFile {
            session_id: session_id.clone(),
        })
        .map_err(|e| Error::Storage(e.to_string()))?;
        std::fs::write(&self.path, contents).map_err(|e| Error::Storage(e.to_string()))
    }

    fn clear(&mut self) -> Result<(), Error> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| Error::Storage(e.to_string()))?;
        }
        Ok(())
    }
}

/// In-memory fallback. Clones share the same slot.
#[derive(Clone, Default)]
pub struct MemoryFallbackStore {
    slot: Arc<Mutex<Option<SessionId>>>,
}

impl MemoryFallbackStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<SessionId> {
        self.slot.lock().clone()
    }
}

impl FallbackStore for MemoryFallbackStore {
    fn load(&self) -> Result<Option<SessionId>, Error> {
        Ok(self.get())
    }

    fn save(&mut self, session_id: &SessionId) -> Result<(), Error> {
        *self.slot.lock() = Some(session_id.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Error> {
        *self.slot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileFallbackStore::in_dir(dir.path());
        let id = SessionId::from("sess-1".to_string());

        assert_eq!(store.load().unwrap(), None);
        store.save(&id).unwrap();
        assert_eq!(store.load().unwrap(), Some(id));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn file_store_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let id = SessionId::from("sess-2".to_string());
        FileFallbackStore::in_dir(dir.path()).save(&id).unwrap();

        let reloaded = FileFallbackStore::in_dir(dir.path());
        assert_eq!(reloaded.load().unwrap(), Some(id));
    }

    #[test]
    fn file_store_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFallbackStore::in_dir(dir.path());
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(Error::Storage(_))));
    }

    #[test]
    fn file_store_clear_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileFallbackStore::in_dir(dir.path());
        store.clear().unwrap();
    }

    #[test]
    fn memory_store_clones_share_slot() {
        let mut store = MemoryFallbackStore::new();
        let observer = store.clone();
        store.save(&SessionId::from("x".to_string())).unwrap();
        assert_eq!(observer.get().map(String::from), Some("x".to_string()));
    }
}
