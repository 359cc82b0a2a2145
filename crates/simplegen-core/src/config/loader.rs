//! Settings loader — reads `~/.simplegen/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Settings::default()`)
//! 2. JSON file at `~/.simplegen/config.json`
//! 3. Environment variables `SIMPLEGEN_<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Settings;

/// Default settings file path.
pub fn get_settings_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load settings from the default path + env vars.
///
/// Falls back to `Settings::default()` if the file doesn't exist or can't be parsed.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let settings_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_settings_path);

    load_settings_from_path(&settings_path)
}

/// Load settings from a specific file path.
fn load_settings_from_path(path: &Path) -> Settings {
    if !path.exists() {
        info!("No settings file found at {}, using defaults", path.display());
        return apply_env_overrides(Settings::default());
    }

    debug!("Loading settings from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read settings file {}: {}", path.display(), e);
            return apply_env_overrides(Settings::default());
        }
    };

    let mut settings: Settings = match serde_json::from_str(&content) {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to parse settings JSON: {}", e);
            return apply_env_overrides(Settings::default());
        }
    };

    if settings.timeout_secs == 0 {
        let fallback = Settings::default().timeout_secs;
        warn!("Ignoring timeoutSecs=0 in {}, using {}s", path.display(), fallback);
        settings.timeout_secs = fallback;
    }

    apply_env_overrides(settings)
}

/// Save settings to disk (pretty-printed JSON with camelCase keys).
pub fn save_settings(settings: &Settings, path: Option<&Path>) -> std::io::Result<()> {
    let settings_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_settings_path);

    if let Some(parent) = settings_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;

    std::fs::write(&settings_path, json)?;
    debug!("Settings saved to {}", settings_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of loaded settings.
///
/// Supported overrides:
/// - `SIMPLEGEN_API_BASE` → `api_base`
/// - `SIMPLEGEN_TIMEOUT_SECS` → `timeout_secs`
/// - `SIMPLEGEN_DATA_DIR` → `data_dir`
/// - `SIMPLEGEN_DEFAULT_USER` → `default_user`
fn apply_env_overrides(mut settings: Settings) -> Settings {
    if let Ok(val) = std::env::var("SIMPLEGEN_API_BASE") {
        settings.api_base = val;
    }
    if let Ok(val) = std::env::var("SIMPLEGEN_TIMEOUT_SECS") {
        match val.parse::<u64>() {
            Ok(n) if n > 0 => settings.timeout_secs = n,
            _ => warn!("Ignoring invalid SIMPLEGEN_TIMEOUT_SECS={}", val),
        }
    }
    if let Ok(val) = std::env::var("SIMPLEGEN_DATA_DIR") {
        settings.data_dir = val;
    }
    if let Ok(val) = std::env::var("SIMPLEGEN_DEFAULT_USER") {
        settings.default_user = val;
    }

    settings
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
