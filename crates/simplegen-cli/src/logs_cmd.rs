//! `simplegen logs` — show recent request log entries.

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use simplegen_core::config::load_settings;
use simplegen_core::store::RequestLogEntry;
use simplegen_core::utils::truncate_string;

use crate::helpers::{format_time, open_stores};

/// Run the logs command.
pub fn run(model: Option<&str>, limit: usize) -> Result<()> {
    let settings = load_settings(None);
    let stores = open_stores(&settings)?;
    let entries = stores.requests.list(model, limit);

    if entries.is_empty() {
        println!("  No requests logged.");
        return Ok(());
    }

    println!();
    println!(
        "  {:<6} {:<20} {:<18} {:<3} {}",
        "ID".bold(),
        "Model".bold(),
        "When".bold(),
        "OK".bold(),
        "Summary".bold(),
    );
    println!("  {}", "─".repeat(76));

    for entry in &entries {
        let ok = if entry.successful {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        println!(
            "  {:<6} {:<20} {:<18} {:<3} {}",
            entry.id,
            truncate_string(&entry.model, 20),
            format_time(&entry.requested_at),
            ok,
            summarize(entry).dimmed(),
        );
    }
    println!();
    Ok(())
}

/// One-line description of an exchange: the provider error or the reply.
fn summarize(entry: &RequestLogEntry) -> String {
    let text = if let Some(error) = entry.response.get("error") {
        error
            .get("message")
            .and_then(Value::as_str)
            .map(|m| format!("error: {m}"))
            .unwrap_or_else(|| format!("error: {error}"))
    } else {
        entry
            .response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or("(no content)")
            .to_string()
    };
    truncate_string(&text.replace('\n', " "), 40)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn entry(response: Value) -> RequestLogEntry {
        RequestLogEntry {
            id: 1,
            model: "m".to_string(),
            requested_at: Utc::now(),
            request: json!({}),
            response,
            attempted: true,
            successful: true,
        }
    }

    #[test]
    fn test_summarize_reply() {
        let e = entry(json!({"choices": [{"message": {"content": "line one\nline two"}}]}));
        assert_eq!(summarize(&e), "line one line two");
    }

    #[test]
    fn test_summarize_error() {
        let e = entry(json!({"error": {"message": "bad key"}}));
        assert_eq!(summarize(&e), "error: bad key");
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&entry(json!({}))), "(no content)");
    }
}
