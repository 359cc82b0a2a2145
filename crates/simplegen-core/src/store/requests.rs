//! Request log — an audit trail of every provider exchange.
//!
//! File format: JSONL in `~/.simplegen/requests.jsonl`, one
//! [`RequestLogEntry`] per line. Appends write a single line; updating an
//! entry rewrites the file atomically. Lines that fail to parse are kept
//! verbatim across rewrites.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::utils;

/// One recorded request/response pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RequestLogEntry {
    /// Monotonically increasing within one log.
    pub id: u64,
    pub model: String,
    pub requested_at: DateTime<Utc>,
    pub request: Value,
    pub response: Value,
    pub attempted: bool,
    /// `true` on creation; flipped when the provider reports an error.
    pub successful: bool,
}

/// Append-mostly request log with an in-memory index.
pub struct RequestLog {
    path: PathBuf,
    entries: RwLock<Vec<RequestLogEntry>>,
    /// Raw lines that failed to parse at open time.
    unreadable: Vec<String>,
}

impl RequestLog {
    pub const FILE_NAME: &'static str = "requests.jsonl";

    /// Open the log in `dir` (defaults to `~/.simplegen/`).
    ///
    /// Lines that fail to parse are skipped with a warning and written back
    /// unchanged whenever the file is rewritten.
    pub fn open(dir: Option<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.unwrap_or_else(utils::get_data_path);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(Self::FILE_NAME);

        let mut entries = Vec::new();
        let mut unreadable = Vec::new();
        if path.exists() {
            let reader = std::io::BufReader::new(std::fs::File::open(&path)?);
            for (lineno, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<RequestLogEntry>(&line) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            line = lineno + 1,
                            error = %e,
                            "skipping unreadable request log line"
                        );
                        unreadable.push(line);
                    }
                }
            }
        }

        debug!(
            path = %path.display(),
            entries = entries.len(),
            skipped = unreadable.len(),
            "opened request log"
        );

        Ok(RequestLog {
            path,
            entries: RwLock::new(entries),
            unreadable,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a new exchange and return it with its assigned id.
    pub fn append(
        &self,
        model: &str,
        request: Value,
        response: Value,
        attempted: bool,
    ) -> Result<RequestLogEntry, StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;

        let entry = RequestLogEntry {
            id,
            model: model.to_string(),
            requested_at: Utc::now(),
            request,
            response,
            attempted,
            successful: true,
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(&entry)?)?;

        entries.push(entry.clone());
        debug!(model, log_id = id, "recorded request");
        Ok(entry)
    }

    /// Persist changes to an existing entry (matched by id).
    ///
    /// The cache is only updated once the rewritten file is in place.
    pub fn save(&self, entry: &RequestLogEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let index = entries
            .iter()
            .position(|e| e.id == entry.id)
            .ok_or(StoreError::LogEntryNotFound(entry.id))?;

        let mut next = entries.clone();
        next[index] = entry.clone();

        let mut buf = Vec::new();
        for line in &self.unreadable {
            writeln!(buf, "{line}")?;
        }
        for e in &next {
            writeln!(buf, "{}", serde_json::to_string(e)?)?;
        }
        utils::write_atomic(&self.path, &buf)?;
        *entries = next;

        debug!(log_id = entry.id, successful = entry.successful, "updated request log entry");
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<RequestLogEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().find(|e| e.id == id).cloned()
    }

    /// Most recent entries first, optionally filtered by model.
    pub fn list(&self, model: Option<&str>, limit: usize) -> Vec<RequestLogEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .rev()
            .filter(|e| model.map_or(true, |m| e.model == m))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lines skipped as unreadable when the log was opened.
    pub fn skipped(&self) -> usize {
        self.unreadable.len()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
