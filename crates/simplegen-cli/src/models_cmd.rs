//! `simplegen models` — manage model configurations from the CLI.
//!
//! - `simplegen models list` — list configured models
//! - `simplegen models show <NAME>` — print a model's parameters (key redacted)
//! - `simplegen models add <NAME> [--api-key K] [--openai-model M] [--system-prompt S]`
//! - `simplegen models set <NAME> <KEY> <VALUE>` — set one parameter
//! - `simplegen models unset <NAME> <KEY>` — remove one parameter
//! - `simplegen models enable <NAME> [--disable]` — enable/disable a model
//! - `simplegen models remove <NAME>` — delete a model

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::{Map, Value};

use simplegen_core::config::load_settings;
use simplegen_core::store::ModelStore;
use simplegen_core::types::{ChatParameters, SystemPromptPosition};
use simplegen_core::utils::{redact_parameters, truncate_string};

use crate::helpers::{format_time, open_stores, parse_value};

// ─────────────────────────────────────────────
// Subcommand enum
// ─────────────────────────────────────────────

/// Model subcommands.
#[derive(Subcommand)]
pub enum ModelsCommands {
    /// List configured models
    List,

    /// Show one model's parameters
    Show {
        /// Model name
        name: String,
    },

    /// Add a model (or merge parameters into an existing one)
    Add {
        /// Model name
        name: String,

        /// Provider API key
        #[arg(long)]
        api_key: Option<String>,

        /// Provider model identifier, e.g. "gpt-4"
        #[arg(long)]
        openai_model: Option<String>,

        /// System prompt text
        #[arg(long)]
        system_prompt: Option<String>,

        /// Where the system prompt goes: append, prepend, or bookend
        #[arg(long, value_parser = parse_position)]
        system_prompt_position: Option<String>,
    },

    /// Set one parameter (VALUE is parsed as JSON, else taken as a string)
    Set {
        name: String,
        key: String,
        value: String,
    },

    /// Remove one parameter
    Unset { name: String, key: String },

    /// Enable or disable a model
    Enable {
        /// Model name
        name: String,

        /// Disable instead of enable
        #[arg(long, default_value_t = false)]
        disable: bool,
    },

    /// Delete a model
    Remove {
        /// Model name
        name: String,
    },
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Dispatch a models subcommand.
pub fn dispatch(cmd: ModelsCommands) -> Result<()> {
    let settings = load_settings(None);
    let stores = open_stores(&settings)?;
    let store = stores.models.as_ref();

    match cmd {
        ModelsCommands::List => list_models(store),
        ModelsCommands::Show { name } => show_model(store, &name),
        ModelsCommands::Add {
            name,
            api_key,
            openai_model,
            system_prompt,
            system_prompt_position,
        } => {
            let mut parameters = Map::new();
            insert_opt(&mut parameters, "openai_api_key", api_key);
            insert_opt(&mut parameters, "openai_model", openai_model);
            insert_opt(&mut parameters, "system_prompt", system_prompt);
            insert_opt(&mut parameters, "system_prompt_position", system_prompt_position);
            add_model(store, &name, parameters)
        }
        ModelsCommands::Set { name, key, value } => set_parameter(store, &name, &key, parse_value(&value)),
        ModelsCommands::Unset { name, key } => {
            let removed = store
                .remove_parameter(&name, &key)
                .with_context(|| format!("failed to unset '{key}' on '{name}'"))?;
            if removed {
                println!("  {} {}.{} removed", "✓".green(), name, key);
            } else {
                println!("  {}.{} was not set", name, key);
            }
            Ok(())
        }
        ModelsCommands::Enable { name, disable } => {
            store
                .set_enabled(&name, !disable)
                .with_context(|| format!("failed to update '{name}'"))?;
            let state = if disable { "disabled".red() } else { "enabled".green() };
            println!("  {} {}", name.bold(), state);
            Ok(())
        }
        ModelsCommands::Remove { name } => {
            if store.remove(&name)? {
                println!("  {} removed {}", "✓".green(), name);
            } else {
                println!("  No model named '{}'.", name);
            }
            Ok(())
        }
    }
}

fn insert_opt(parameters: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(v) = value {
        parameters.insert(key.to_string(), Value::String(v));
    }
}

/// clap value parser for `--system-prompt-position`.
fn parse_position(raw: &str) -> Result<String, String> {
    serde_json::from_value::<SystemPromptPosition>(Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| format!("'{raw}' is not one of append, prepend, bookend"))
        .and_then(|position| match serde_json::to_value(position) {
            Ok(Value::String(s)) => Ok(s),
            _ => Err(format!("'{raw}' is not a valid position")),
        })
}

/// Reject `updates` if merging them into `existing` would leave a
/// configuration that a chat call can't read.
fn check_parameters(existing: &Map<String, Value>, updates: &Map<String, Value>) -> Result<()> {
    let mut merged = existing.clone();
    merged.extend(updates.clone());
    ChatParameters::from_map(&merged).context("invalid model parameters")?;
    Ok(())
}

// ─────────────────────────────────────────────
// Command implementations
// ─────────────────────────────────────────────

/// `simplegen models list`
fn list_models(store: &ModelStore) -> Result<()> {
    let records = store.list();
    if records.is_empty() {
        println!("  No models configured.");
        return Ok(());
    }

    println!();
    println!("{}", "  Models".cyan().bold());
    println!();
    println!(
        "  {:<24} {:<16} {:<10} {}",
        "Name".bold(),
        "Provider model".bold(),
        "Status".bold(),
        "Updated".bold(),
    );
    println!("  {}", "─".repeat(70));

    for record in &records {
        let provider_model = record
            .parameters
            .get("openai_model")
            .and_then(Value::as_str)
            .unwrap_or("—");
        let status = if record.enabled {
            "enabled".green().to_string()
        } else {
            "disabled".red().to_string()
        };
        println!(
            "  {:<24} {:<16} {:<10} {}",
            truncate_string(&record.name, 24),
            truncate_string(provider_model, 16),
            status,
            format_time(&record.updated_at).dimmed(),
        );
        if let Some(reason) = record.disabled_reason() {
            println!("  {:<24} {}", "", reason.dimmed());
        }
    }
    println!();
    Ok(())
}

/// `simplegen models show <NAME>`
fn show_model(store: &ModelStore, name: &str) -> Result<()> {
    let record = store
        .get(name)
        .with_context(|| format!("unknown model '{name}'"))?;

    println!();
    println!("  {:<12} {}", "Name:".bold(), record.name);
    println!(
        "  {:<12} {}",
        "Status:".bold(),
        if record.enabled { "enabled".green() } else { "disabled".red() }
    );
    println!("  {:<12} {}", "Created:".bold(), format_time(&record.created_at));
    println!("  {:<12} {}", "Updated:".bold(), format_time(&record.updated_at));
    println!("  {}", "Parameters:".bold());

    let redacted = Value::Object(redact_parameters(&record.parameters));
    for line in serde_json::to_string_pretty(&redacted)?.lines() {
        println!("    {line}");
    }
    println!();
    Ok(())
}

/// `simplegen models set <NAME> <KEY> <VALUE>`
fn set_parameter(store: &ModelStore, name: &str, key: &str, value: Value) -> Result<()> {
    let record = store
        .get(name)
        .with_context(|| format!("unknown model '{name}'"))?;

    let mut update = Map::new();
    update.insert(key.to_string(), value.clone());
    check_parameters(&record.parameters, &update)
        .with_context(|| format!("refusing to set '{key}' on '{name}'"))?;

    store
        .set_parameter(name, key, value)
        .with_context(|| format!("failed to set '{key}' on '{name}'"))?;
    println!("  {} {}.{} updated", "✓".green(), name, key);
    Ok(())
}

/// `simplegen models add <NAME> ...`
fn add_model(store: &ModelStore, name: &str, parameters: Map<String, Value>) -> Result<()> {
    let existing = store.get(name).map(|r| r.parameters).unwrap_or_default();
    check_parameters(&existing, &parameters)
        .with_context(|| format!("refusing to save model '{name}'"))?;

    let existed = store.contains(name);
    store
        .upsert(name, parameters)
        .with_context(|| format!("failed to save model '{name}'"))?;

    if existed {
        println!("  {} updated {}", "✓".green(), name.bold());
    } else {
        println!("  {} added {}", "✓".green(), name.bold());
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
