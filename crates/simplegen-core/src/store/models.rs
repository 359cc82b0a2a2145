//! Model store — configured chat models, persisted as one JSON document.
//!
//! File format: `~/.simplegen/models.json`, an object keyed by model name:
//! `{"support-bot": {"name": "support-bot", "enabled": true, "parameters": {...}, ...}}`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::utils;

/// Parameter keys written when a model is disabled after a provider error.
pub const DISABLED_REASON: &str = "disabled_reason";
pub const DISABLED_TIME: &str = "disabled_time";

// ─────────────────────────────────────────────
// ModelRecord
// ─────────────────────────────────────────────

/// One configured chat model.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelRecord {
    pub name: String,
    pub enabled: bool,
    /// Credentials, provider model id, system prompt, tuning overrides.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModelRecord {
    /// Create a new, enabled record.
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        let now = Utc::now();
        ModelRecord {
            name: name.into(),
            enabled: true,
            parameters,
            created_at: now,
            updated_at: now,
        }
    }

    /// Why the model was disabled, if it was disabled after an error.
    pub fn disabled_reason(&self) -> Option<&str> {
        self.parameters.get(DISABLED_REASON).and_then(Value::as_str)
    }
}

// ─────────────────────────────────────────────
// ModelStore
// ─────────────────────────────────────────────

/// Configured models with an in-memory cache and JSON persistence.
///
/// Every mutation rewrites `models.json` and is visible through the cache
/// only once that write has succeeded. Concurrent writers inside one
/// process are serialised by the lock; across processes the last write wins.
pub struct ModelStore {
    path: PathBuf,
    records: RwLock<BTreeMap<String, ModelRecord>>,
}

impl ModelStore {
    pub const FILE_NAME: &'static str = "models.json";

    /// Open the store in `dir` (defaults to `~/.simplegen/`).
    ///
    /// The directory is created if it doesn't exist; a missing file means an
    /// empty store.
    pub fn open(dir: Option<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.unwrap_or_else(utils::get_data_path);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(Self::FILE_NAME);

        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), models = records.len(), "opened model store");

        Ok(ModelStore {
            path,
            records: RwLock::new(records),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<ModelRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.contains_key(name)
    }

    /// All models, sorted by name.
    pub fn list(&self) -> Vec<ModelRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.values().cloned().collect()
    }

    /// Create a model, or merge `parameters` into an existing one.
    pub fn upsert(
        &self,
        name: &str,
        parameters: Map<String, Value>,
    ) -> Result<ModelRecord, StoreError> {
        validate_name(name)?;

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = records.clone();
        let created = !next.contains_key(name);
        let record = match next.get_mut(name) {
            Some(existing) => {
                existing.parameters.extend(parameters);
                existing.updated_at = Utc::now();
                existing.clone()
            }
            None => {
                let record = ModelRecord::new(name, parameters);
                next.insert(name.to_string(), record.clone());
                record
            }
        };

        self.persist(&next)?;
        *records = next;
        if created {
            info!(model = name, "created model");
        }
        Ok(record)
    }

    /// Shallow-merge `updates` into a model's parameters.
    pub fn update_parameters(
        &self,
        name: &str,
        updates: Map<String, Value>,
    ) -> Result<ModelRecord, StoreError> {
        self.mutate(name, |record| {
            record.parameters.extend(updates);
            record.clone()
        })
    }

    /// Set a single parameter.
    pub fn set_parameter(&self, name: &str, key: &str, value: Value) -> Result<(), StoreError> {
        self.mutate(name, |record| {
            record.parameters.insert(key.to_string(), value);
        })
    }

    /// Remove a single parameter. Returns whether it was present.
    pub fn remove_parameter(&self, name: &str, key: &str) -> Result<bool, StoreError> {
        self.mutate(name, |record| record.parameters.remove(key).is_some())
    }

    /// Enable or disable a model.
    ///
    /// Enabling also clears `disabled_reason` and `disabled_time`.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), StoreError> {
        self.mutate(name, |record| {
            record.enabled = enabled;
            if enabled {
                record.parameters.remove(DISABLED_REASON);
                record.parameters.remove(DISABLED_TIME);
            }
        })
    }

    /// Delete a model. Returns whether it existed.
    pub fn remove(&self, name: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if !records.contains_key(name) {
            return Ok(false);
        }
        let mut next = records.clone();
        next.remove(name);
        self.persist(&next)?;
        *records = next;
        info!(model = name, "removed model");
        Ok(true)
    }

    /// Apply `f` to a copy of a stored record, bump `updated_at`, persist,
    /// and only then publish the copy to the cache.
    fn mutate<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut ModelRecord) -> T,
    ) -> Result<T, StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let mut record = records
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::ModelNotFound(name.to_string()))?;

        let out = f(&mut record);
        record.updated_at = Utc::now();

        let mut next = records.clone();
        next.insert(name.to_string(), record);
        self.persist(&next)?;
        *records = next;
        Ok(out)
    }

    /// Rewrite `models.json` atomically.
    fn persist(&self, records: &BTreeMap<String, ModelRecord>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;
        utils::write_atomic(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), models = records.len(), "saved model store");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.trim() != name {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn make_store() -> (ModelStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = ModelStore::open(Some(dir.path().to_path_buf())).unwrap();
        (store, dir)
    }

    #[test]
    fn test_open_empty() {
        let (store, _dir) = make_store();
        assert!(store.list().is_empty());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_upsert_creates_enabled_model() {
        let (store, _dir) = make_store();
        let record = store
            .upsert("support", params(json!({"openai_api_key": "k"})))
            .unwrap();

        assert!(record.enabled);
        assert_eq!(record.parameters["openai_api_key"], "k");
        assert!(store.contains("support"));
    }

    #[test]
    fn test_upsert_merges_existing() {
        let (store, _dir) = make_store();
        store.upsert("support", params(json!({"openai_api_key": "k"}))).unwrap();
        store.upsert("support", params(json!({"openai_model": "gpt-4"}))).unwrap();

        let record = store.get("support").unwrap();
        assert_eq!(record.parameters["openai_api_key"], "k");
        assert_eq!(record.parameters["openai_model"], "gpt-4");
    }

    #[test]
    fn test_invalid_name_rejected() {
        let (store, _dir) = make_store();
        assert!(matches!(
            store.upsert("", Map::new()),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.upsert(" padded ", Map::new()),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn test_update_parameters_is_shallow_merge() {
        let (store, _dir) = make_store();
        store
            .upsert("m", params(json!({"openai_api_key": "k", "openai_model": "gpt-4"})))
            .unwrap();

        store
            .update_parameters("m", params(json!({"disabled_reason": "boom"})))
            .unwrap();

        let record = store.get("m").unwrap();
        assert_eq!(record.parameters["openai_api_key"], "k");
        assert_eq!(record.disabled_reason(), Some("boom"));
    }

    #[test]
    fn test_update_missing_model() {
        let (store, _dir) = make_store();
        let err = store.update_parameters("ghost", Map::new()).unwrap_err();
        assert!(matches!(err, StoreError::ModelNotFound(name) if name == "ghost"));
    }

    #[test]
    fn test_reenable_clears_disabled_markers() {
        let (store, _dir) = make_store();
        store.upsert("m", Map::new()).unwrap();
        store
            .update_parameters(
                "m",
                params(json!({"disabled_reason": "x", "disabled_time": "t"})),
            )
            .unwrap();
        store.set_enabled("m", false).unwrap();
        assert!(!store.get("m").unwrap().enabled);

        store.set_enabled("m", true).unwrap();
        let record = store.get("m").unwrap();
        assert!(record.enabled);
        assert!(record.disabled_reason().is_none());
        assert!(!record.parameters.contains_key(DISABLED_TIME));
    }

    #[test]
    fn test_set_and_remove_parameter() {
        let (store, _dir) = make_store();
        store.upsert("m", Map::new()).unwrap();
        store.set_parameter("m", "temperature", json!(0.3)).unwrap();
        assert_eq!(store.get("m").unwrap().parameters["temperature"], json!(0.3));

        assert!(store.remove_parameter("m", "temperature").unwrap());
        assert!(!store.remove_parameter("m", "temperature").unwrap());
    }

    #[test]
    fn test_remove_model() {
        let (store, _dir) = make_store();
        store.upsert("m", Map::new()).unwrap();
        assert!(store.remove("m").unwrap());
        assert!(!store.remove("m").unwrap());
    }

    #[test]
    fn test_list_sorted_by_name() {
        let (store, _dir) = make_store();
        store.upsert("zeta", Map::new()).unwrap();
        store.upsert("alpha", Map::new()).unwrap();

        let names: Vec<String> = store.list().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempdir().unwrap();
        {
            let store = ModelStore::open(Some(dir.path().to_path_buf())).unwrap();
            store
                .upsert("m", params(json!({"openai_model": "gpt-4"})))
                .unwrap();
            store.set_enabled("m", false).unwrap();
        }

        let reopened = ModelStore::open(Some(dir.path().to_path_buf())).unwrap();
        let record = reopened.get("m").unwrap();
        assert!(!record.enabled);
        assert_eq!(record.parameters["openai_model"], "gpt-4");
    }

    #[test]
    fn test_failed_write_leaves_cache_unchanged() {
        let (store, dir) = make_store();
        store.upsert("m", params(json!({"openai_model": "gpt-4"}))).unwrap();

        // A directory where the file should be makes every write fail.
        let path = dir.path().join(ModelStore::FILE_NAME);
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(store.set_enabled("m", false), Err(StoreError::Io(_))));
        assert!(store.set_parameter("m", "temperature", json!(0.1)).is_err());
        assert!(store.upsert("other", Map::new()).is_err());
        assert!(store.remove("m").is_err());

        let record = store.get("m").unwrap();
        assert!(record.enabled);
        assert!(!record.parameters.contains_key("temperature"));
        assert!(!store.contains("other"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(ModelStore::FILE_NAME), "{not json").unwrap();
        let result = ModelStore::open(Some(dir.path().to_path_buf()));
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
