//! Settings schema.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils;

/// Application settings — loaded from `~/.simplegen/config.json` + env vars.
///
/// These are process-wide knobs. Per-model credentials and tuning live in
/// the model store, not here.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Provider API base; `/chat/completions` is appended.
    pub api_base: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Directory holding `models.json` and `requests.jsonl`.
    pub data_dir: String,
    /// End-user tag forwarded to the provider when the caller gives none.
    pub default_user: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            timeout_secs: 60,
            data_dir: "~/.simplegen".to_string(),
            default_user: "openai_user".to_string(),
        }
    }
}

impl Settings {
    /// Data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        utils::expand_home(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_base, "https://api.openai.com/v1");
        assert_eq!(settings.timeout_secs, 60);
        assert_eq!(settings.default_user, "openai_user");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"timeoutSecs": 5}"#).unwrap();
        assert_eq!(settings.timeout_secs, 5);
        assert_eq!(settings.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_data_path_expands_home() {
        let settings = Settings::default();
        assert!(!settings.data_path().starts_with("~"));
        assert!(settings.data_path().ends_with(".simplegen"));
    }
}
