//! Model configurations and the request audit log.
//!
//! The dispatcher never touches files directly; it receives a
//! [`ModelConfig`] — the capability to read one model's parameters, update
//! them, disable it, and record exchanges. [`StoredModel`] is the
//! file-backed implementation over [`ModelStore`] + [`RequestLog`].

pub mod models;
pub mod requests;

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

pub use models::{ModelRecord, ModelStore, DISABLED_REASON, DISABLED_TIME};
pub use requests::{RequestLog, RequestLogEntry};

use crate::error::StoreError;

// ─────────────────────────────────────────────
// ModelConfig trait
// ─────────────────────────────────────────────

/// One configured chat model, as seen by the dispatcher and validator.
pub trait ModelConfig: Send + Sync {
    /// Human-readable identity used in errors and logs.
    fn name(&self) -> &str;

    /// Current parameter object.
    fn fetch_parameters(&self) -> Result<Map<String, Value>, StoreError>;

    /// Shallow-merge `updates` into the stored parameters.
    fn update_parameters(&self, updates: Map<String, Value>) -> Result<(), StoreError>;

    fn set_enabled(&self, enabled: bool) -> Result<(), StoreError>;

    /// Record an exchange. The returned entry starts out `successful`.
    fn log_request(
        &self,
        request: &Value,
        response: &Value,
        attempted: bool,
    ) -> Result<RequestLogEntry, StoreError>;

    /// Persist changes made to an entry returned by [`log_request`](Self::log_request).
    fn save_request_log(&self, entry: &RequestLogEntry) -> Result<(), StoreError>;
}

// ─────────────────────────────────────────────
// StoredModel
// ─────────────────────────────────────────────

/// Handle to a model in a [`ModelStore`], logging to a [`RequestLog`].
#[derive(Clone)]
pub struct StoredModel {
    models: Arc<ModelStore>,
    requests: Arc<RequestLog>,
    name: String,
}

impl StoredModel {
    /// Handle to an existing model.
    pub fn open(
        models: Arc<ModelStore>,
        requests: Arc<RequestLog>,
        name: &str,
    ) -> Result<Self, StoreError> {
        if !models.contains(name) {
            return Err(StoreError::ModelNotFound(name.to_string()));
        }
        Ok(StoredModel {
            models,
            requests,
            name: name.to_string(),
        })
    }

    /// Snapshot of the underlying record.
    pub fn record(&self) -> Result<ModelRecord, StoreError> {
        self.models
            .get(&self.name)
            .ok_or_else(|| StoreError::ModelNotFound(self.name.clone()))
    }
}

impl fmt::Display for StoredModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for StoredModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredModel")
            .field("name", &self.name)
            .field("store", &self.models.path())
            .finish()
    }
}

impl ModelConfig for StoredModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_parameters(&self) -> Result<Map<String, Value>, StoreError> {
        self.record().map(|r| r.parameters)
    }

    fn update_parameters(&self, updates: Map<String, Value>) -> Result<(), StoreError> {
        self.models.update_parameters(&self.name, updates).map(|_| ())
    }

    fn set_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.models.set_enabled(&self.name, enabled)
    }

    fn log_request(
        &self,
        request: &Value,
        response: &Value,
        attempted: bool,
    ) -> Result<RequestLogEntry, StoreError> {
        self.requests
            .append(&self.name, request.clone(), response.clone(), attempted)
    }

    fn save_request_log(&self, entry: &RequestLogEntry) -> Result<(), StoreError> {
        self.requests.save(entry)
    }
}
