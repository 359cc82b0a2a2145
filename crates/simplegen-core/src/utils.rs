//! Utility helpers — path resolution, timestamps, string and parameter tidying.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Placeholder written in place of credentials in log output.
pub const REDACTED: &str = "****";

/// Get the simplegen data directory (e.g. `~/.simplegen/`).
pub fn get_data_path() -> PathBuf {
    home_dir().join(".simplegen")
}

/// Get current ISO 8601 timestamp.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Expand `~` to the home directory in a path string.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else if path == "~" {
        home_dir()
    } else {
        PathBuf::from(path)
    }
}

/// Copy of a parameter object with credential values masked.
///
/// Any top-level key containing `api_key`, `secret`, or `token` (but not a
/// `max_*` token limit) is replaced.
pub fn redact_parameters(parameters: &Map<String, Value>) -> Map<String, Value> {
    parameters
        .iter()
        .map(|(key, value)| {
            let lowered = key.to_ascii_lowercase();
            let sensitive = lowered.contains("api_key")
                || lowered.contains("secret")
                || (lowered.contains("token") && !lowered.contains("max_"));
            if sensitive && !value.is_null() {
                (key.clone(), Value::String(REDACTED.to_string()))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

/// Replace `path` with `contents` via a sibling `.tmp` file and a rename.
///
/// On failure the previous file is untouched and the temp file is removed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = std::fs::write(&tmp, contents).and_then(|()| std::fs::rename(&tmp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

/// The user's home directory, or `.` when it can't be determined.
fn home_dir() -> PathBuf {
    dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
