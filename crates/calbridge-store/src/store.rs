//! Store accessor trait and backends.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

use calbridge_core::VEvent;

use crate::error::{StoreError, StoreResult};

/// Accessor for the internal event store.
///
/// Mutations happen strictly after the corresponding remote mutation is
/// confirmed, so implementations do not need remote awareness of any kind;
/// they only guarantee identifier-keyed consistency.
pub trait EventStore: Send + Sync {
    /// Retrieves the record at `id`, or [`StoreError::NotFound`].
    fn retrieve(&self, id: &str) -> StoreResult<VEvent>;

    /// Creates a new record keyed by its `id` field.
    ///
    /// Fails with [`StoreError::Conflict`] if the identifier is taken.
    fn create(&self, event: &VEvent) -> StoreResult<()>;

    /// Overwrites the record at `id`.
    fn update(&self, id: &str, event: &VEvent) -> StoreResult<()>;

    /// Removes the record at `id`, or [`StoreError::NotFound`].
    fn delete(&self, id: &str) -> StoreResult<()>;
}

/// In-memory store backed by a hash map.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    records: RwLock<HashMap<String, VEvent>>,
}

impl MemoryEventStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}

impl EventStore for MemoryEventStore {
    fn retrieve(&self, id: &str) -> StoreResult<VEvent> {
        self.records
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn create(&self, event: &VEvent) -> StoreResult<()> {
        let mut records = self.records.write().unwrap();
        if records.contains_key(&event.id) {
            return Err(StoreError::conflict(&event.id));
        }
        records.insert(event.id.clone(), event.clone());
        Ok(())
    }

    fn update(&self, id: &str, event: &VEvent) -> StoreResult<()> {
        let mut records = self.records.write().unwrap();
        if !records.contains_key(id) {
            return Err(StoreError::not_found(id));
        }
        records.insert(id.to_string(), event.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        self.records
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(id))
    }
}

/// File-backed store persisting all records as one JSON document.
///
/// The whole map is cached in memory and rewritten on every mutation with a
/// temp-file + rename so a crash never leaves a half-written document.
#[derive(Debug)]
pub struct JsonFileEventStore {
    path: PathBuf,
    records: RwLock<HashMap<String, VEvent>>,
}

impl JsonFileEventStore {
    /// Opens a store at the given path, loading the document if it exists.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let records = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let loaded: HashMap<String, VEvent> = serde_json::from_str(&content)?;
            info!(path = %path.display(), records = loaded.len(), "loaded event store");
            loaded
        } else {
            debug!(path = %path.display(), "no event store document, starting empty");
            HashMap::new()
        };

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Returns the backing document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &HashMap<String, VEvent>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(records)?;
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), records = records.len(), "persisted event store");
        Ok(())
    }
}

impl EventStore for JsonFileEventStore {
    fn retrieve(&self, id: &str) -> StoreResult<VEvent> {
        self.records
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn create(&self, event: &VEvent) -> StoreResult<()> {
        let mut records = self.records.write().unwrap();
        if records.contains_key(&event.id) {
            return Err(StoreError::conflict(&event.id));
        }
        records.insert(event.id.clone(), event.clone());
        self.persist(&records)
    }

    fn update(&self, id: &str, event: &VEvent) -> StoreResult<()> {
        let mut records = self.records.write().unwrap();
        if !records.contains_key(id) {
            return Err(StoreError::not_found(id));
        }
        records.insert(id.to_string(), event.clone());
        self.persist(&records)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let mut records = self.records.write().unwrap();
        records
            .remove(id)
            .ok_or_else(|| StoreError::not_found(id))?;
        self.persist(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calbridge_core::SourceType;

    fn sample_event(id: &str) -> VEvent {
        VEvent {
            id: id.to_string(),
            src_type: SourceType::Google,
            src_account_name: "user@example.com".into(),
            src_id: id.to_string(),
            src_url: None,
            src_updated: None,
            dtstart: "/Date(1700000000000)/".into(),
            dtend: "/Date(1700003600000)/".into(),
            summary: Some("Standup".into()),
            description: None,
            location: None,
            organizer: None,
            attendees: vec![],
        }
    }

    #[test]
    fn memory_store_crud() {
        let store = MemoryEventStore::new();
        let event = sample_event("evt-1");

        assert!(store.retrieve("evt-1").unwrap_err().is_not_found());

        store.create(&event).unwrap();
        assert_eq!(store.retrieve("evt-1").unwrap(), event);

        let mut updated = event.clone();
        updated.summary = Some("Renamed".into());
        store.update("evt-1", &updated).unwrap();
        assert_eq!(store.retrieve("evt-1").unwrap().summary.as_deref(), Some("Renamed"));

        store.delete("evt-1").unwrap();
        assert!(store.retrieve("evt-1").unwrap_err().is_not_found());
    }

    #[test]
    fn memory_store_create_conflict() {
        let store = MemoryEventStore::new();
        store.create(&sample_event("evt-1")).unwrap();
        let err = store.create(&sample_event("evt-1")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn memory_store_update_missing_is_not_found() {
        let store = MemoryEventStore::new();
        let err = store.update("ghost", &sample_event("ghost")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        {
            let store = JsonFileEventStore::open(&path).unwrap();
            store.create(&sample_event("evt-1")).unwrap();
            store.create(&sample_event("evt-2")).unwrap();
            store.delete("evt-2").unwrap();
        }

        let reopened = JsonFileEventStore::open(&path).unwrap();
        assert!(reopened.retrieve("evt-1").is_ok());
        assert!(reopened.retrieve("evt-2").unwrap_err().is_not_found());
    }

    #[test]
    fn file_store_starts_empty_without_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileEventStore::open(dir.path().join("missing.json")).unwrap();
        assert!(store.retrieve("anything").unwrap_err().is_not_found());
    }
}
