//! Persisted saved-species identifiers.
//!
//! The on-disk layout mirrors browser local storage: a flat JSON object whose
//! values are strings, each one a JSON-encoded array of species codes.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::config::SavedListKind;
use crate::error::StoreError;

/// Load/save access to one saved list.
pub trait IdentifierStore {
    /// Never fails; missing or unreadable data is an empty list.
    fn load(&self, key: &str) -> Vec<String>;

    fn save(&self, key: &str, ids: &[String]) -> Result<(), StoreError>;
}

/// `ids` with `id` removed if present, otherwise with `id` appended.
pub fn toggle(ids: &[String], id: &str) -> Vec<String> {
    if ids.iter().any(|saved| saved == id) {
        ids.iter().filter(|saved| *saved != id).cloned().collect()
    } else {
        let mut updated = ids.to_vec();
        updated.push(id.to_string());
        updated
    }
}

fn decode_ids(key: &str, raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(ids) => dedup(ids),
        Err(e) => {
            warn!("Ignoring malformed saved list under {key:?}: {e}");
            Vec::new()
        }
    }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

/// JSON file standing in for the browser's local storage.
///
/// Clones share one file lock, so lists kept under different keys of the
/// same file never overwrite each other's writes.
#[derive(Clone)]
pub struct LocalStorage {
    path: PathBuf,
    file_lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: Arc::new(Mutex::new(())),
        }
    }

    fn read_entries(&self) -> BTreeMap<String, String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("No readable storage at {:?}: {}", self.path, e);
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("Storage file {:?} is malformed, treating it as empty: {}", self.path, e);
            BTreeMap::new()
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, encoded)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

impl IdentifierStore for LocalStorage {
    fn load(&self, key: &str) -> Vec<String> {
        let _guard = self.file_lock.lock().unwrap_or_else(|p| p.into_inner());
        self.read_entries()
            .get(key)
            .map(|raw| decode_ids(key, raw))
            .unwrap_or_default()
    }

    fn save(&self, key: &str, ids: &[String]) -> Result<(), StoreError> {
        let _guard = self.file_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut entries = self.read_entries();
        entries.insert(key.to_string(), serde_json::to_string(ids)?);
        self.write_entries(&entries)
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a raw value under `key`, bypassing encoding.
    pub fn insert_raw(&self, key: &str, raw: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), raw.to_string());
        }
    }
}

#[cfg(test)]
impl IdentifierStore for MemoryStore {
    fn load(&self, key: &str) -> Vec<String> {
        let entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .get(key)
            .map(|raw| decode_ids(key, raw))
            .unwrap_or_default()
    }

    fn save(&self, key: &str, ids: &[String]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(ids)?;
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), encoded);
        Ok(())
    }
}

/// A store bound to one saved-list kind.
///
/// Toggles hold the lock across load, update and save, so readers in this
/// process see either the old list or the new one.
pub struct SavedList<S> {
    store: S,
    kind: SavedListKind,
    lock: Mutex<()>,
}

impl<S: IdentifierStore> SavedList<S> {
    pub fn new(store: S, kind: SavedListKind) -> Self {
        Self {
            store,
            kind,
            lock: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> SavedListKind {
        self.kind
    }

    pub fn ids(&self) -> Vec<String> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.store.load(self.kind.storage_key())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids().iter().any(|saved| saved == id)
    }

    /// Returns whether `id` is saved after the toggle.
    pub fn toggle(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let key = self.kind.storage_key();
        let updated = toggle(&self.store.load(key), id);
        self.store.save(key, &updated)?;
        Ok(updated.iter().any(|saved| saved == id))
    }

    /// Returns whether anything was removed.
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let key = self.kind.storage_key();
        let ids = self.store.load(key);
        if !ids.iter().any(|saved| saved == id) {
            return Ok(false);
        }
        self.store.save(key, &toggle(&ids, id))?;
        Ok(true)
    }
}
