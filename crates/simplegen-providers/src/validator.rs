//! Model validation — structural checks on a model's stored parameters.
//!
//! A clean result means the required keys are present; it says nothing about
//! whether the credential is accepted by the provider.

use simplegen_core::store::ModelConfig;
use simplegen_core::types::ChatParameters;
use simplegen_core::StoreError;
use thiserror::Error;
use tracing::debug;

pub const MISSING_API_KEY: &str = "Add valid \"openai_api_key\" parameter to model";
pub const MISSING_MODEL: &str =
    "Specify \"openai_model\" type parameter for model (see https://platform.openai.com/docs/models)";

/// Why a model could not be validated at all.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The parameters could not be loaded.
    #[error("unable to load parameters for model \"{model}\": {source}")]
    Unreadable {
        model: String,
        #[source]
        source: StoreError,
    },

    /// The parameters loaded but a known key has the wrong shape.
    #[error("parameters for model \"{model}\" are malformed: {source}")]
    Malformed {
        model: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Check a model's parameters, distinguishing missing keys (returned as
/// issue strings) from parameters that cannot be read at all.
pub fn validate_model(model: &dyn ModelConfig) -> Result<Vec<String>, ValidationError> {
    let raw = model
        .fetch_parameters()
        .map_err(|source| ValidationError::Unreadable {
            model: model.name().to_string(),
            source,
        })?;

    let params = ChatParameters::from_map(&raw).map_err(|source| ValidationError::Malformed {
        model: model.name().to_string(),
        source,
    })?;

    let mut issues = Vec::new();
    if params.openai_api_key.is_none() {
        issues.push(MISSING_API_KEY.to_string());
    }
    if params.openai_model.is_none() {
        issues.push(MISSING_MODEL.to_string());
    }
    Ok(issues)
}

/// Issue list for display: a validation failure becomes a single generic
/// issue naming the model.
pub fn model_issues(model: &dyn ModelConfig) -> Vec<String> {
    match validate_model(model) {
        Ok(issues) => issues,
        Err(e) => {
            debug!(model = model.name(), error = %e, "model validation failed");
            vec![format!(
                "Unable to load or validate model \"{}\". Check that the parameters are formatted correctly.",
                model.name()
            )]
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use simplegen_core::store::{ModelStore, RequestLog, StoredModel};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn model_with(params: Value) -> (StoredModel, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let models = Arc::new(ModelStore::open(Some(dir.path().to_path_buf())).unwrap());
        let requests = Arc::new(RequestLog::open(Some(dir.path().to_path_buf())).unwrap());
        models
            .upsert("m", params.as_object().cloned().unwrap_or_default())
            .unwrap();
        (StoredModel::open(models, requests, "m").unwrap(), dir)
    }

    #[test]
    fn test_valid_model_has_no_issues() {
        let (model, _dir) = model_with(json!({"openai_api_key": "k", "openai_model": "gpt-4"}));
        assert!(validate_model(&model).unwrap().is_empty());
        assert!(model_issues(&model).is_empty());
    }

    #[test]
    fn test_missing_api_key() {
        let (model, _dir) = model_with(json!({"openai_model": "gpt-4"}));
        let issues = validate_model(&model).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("openai_api_key"));
    }

    #[test]
    fn test_missing_model() {
        let (model, _dir) = model_with(json!({"openai_api_key": "k"}));
        let issues = validate_model(&model).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("openai_model"));
    }

    #[test]
    fn test_missing_both() {
        let (model, _dir) = model_with(json!({}));
        let issues = validate_model(&model).unwrap();
        assert_eq!(issues, vec![MISSING_API_KEY.to_string(), MISSING_MODEL.to_string()]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let (model, _dir) = model_with(json!({"openai_api_key": null, "openai_model": "gpt-4"}));
        let issues = validate_model(&model).unwrap();
        assert!(issues[0].contains("openai_api_key"));
    }

    #[test]
    fn test_malformed_parameters() {
        let (model, _dir) = model_with(json!({
            "openai_api_key": "k",
            "openai_model": "gpt-4",
            "system_prompt_position": "sideways"
        }));

        assert!(matches!(
            validate_model(&model),
            Err(ValidationError::Malformed { .. })
        ));

        let issues = model_issues(&model);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("Unable to load or validate model \"m\""));
    }

    struct Unreadable;

    impl ModelConfig for Unreadable {
        fn name(&self) -> &str {
            "broken"
        }
        fn fetch_parameters(&self) -> Result<Map<String, Value>, StoreError> {
            Err(StoreError::ModelNotFound("broken".to_string()))
        }
        fn update_parameters(&self, _updates: Map<String, Value>) -> Result<(), StoreError> {
            Ok(())
        }
        fn set_enabled(&self, _enabled: bool) -> Result<(), StoreError> {
            Ok(())
        }
        fn log_request(
            &self,
            _request: &Value,
            _response: &Value,
            _attempted: bool,
        ) -> Result<simplegen_core::store::RequestLogEntry, StoreError> {
            Err(StoreError::LogEntryNotFound(0))
        }
        fn save_request_log(
            &self,
            _entry: &simplegen_core::store::RequestLogEntry,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_unreadable_parameters() {
        assert!(matches!(
            validate_model(&Unreadable),
            Err(ValidationError::Unreadable { .. })
        ));
        let issues = model_issues(&Unreadable);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("broken"));
    }
}
