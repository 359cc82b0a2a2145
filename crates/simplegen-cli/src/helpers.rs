//! Shared CLI helpers — store opening, value parsing, output formatting.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use serde_json::Value;

use simplegen_core::config::Settings;
use simplegen_core::store::{ModelStore, RequestLog};

/// The two stores every data command needs.
pub struct Stores {
    pub models: Arc<ModelStore>,
    pub requests: Arc<RequestLog>,
}

/// Open the model store and request log under the settings data dir.
pub fn open_stores(settings: &Settings) -> Result<Stores> {
    let dir = data_dir(settings);
    let models = ModelStore::open(Some(dir.clone()))
        .with_context(|| format!("failed to open model store in {}", dir.display()))?;
    let requests = RequestLog::open(Some(dir.clone()))
        .with_context(|| format!("failed to open request log in {}", dir.display()))?;

    Ok(Stores {
        models: Arc::new(models),
        requests: Arc::new(requests),
    })
}

/// Resolve the data directory, expanding `~` against the user's home.
pub fn data_dir(settings: &Settings) -> PathBuf {
    settings.data_path()
}

/// Parse a CLI value as JSON, falling back to a plain string.
///
/// `0.7` → number, `true` → bool, `["a"]` → array, `gpt-4` → `"gpt-4"`.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Format a UTC timestamp in local time.
pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Print a model reply to stdout.
pub fn print_response(model: &str, reply: &str) {
    println!();
    println!("{}", model.cyan().bold());
    if reply.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{reply}");
    }
    println!();
}
