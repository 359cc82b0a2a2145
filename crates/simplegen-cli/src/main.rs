//! simplegen CLI — entry point.
//!
//! # Commands
//!
//! - `simplegen run <MODEL> [-m PROMPT]` — send one prompt to a configured model
//! - `simplegen validate [MODEL]` — check model parameters
//! - `simplegen models ...` — manage model configurations
//! - `simplegen logs` — inspect the request log
//! - `simplegen status` — show settings and store status

mod helpers;
mod logs_cmd;
mod models_cmd;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use simplegen_core::config::load_settings;
use simplegen_core::store::StoredModel;
use simplegen_core::types::Extras;
use simplegen_providers::{model_issues, ChatDispatcher, GenerativeBackend, PromptTransformers};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// simplegen — send chat prompts to configured OpenAI models
#[derive(Parser)]
#[command(name = "simplegen", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt to a configured model
    Run {
        /// Model name (as shown by `simplegen models list`)
        model: String,

        /// Prompt text. Omit to send only seeded and system messages.
        #[arg(short, long)]
        message: Option<String>,

        /// End-user tag forwarded to the provider
        #[arg(short, long)]
        user: Option<String>,

        /// Extras as a JSON object, e.g. '{"messages": [...]}'
        #[arg(long)]
        extras: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Validate one model, or all models
    Validate {
        /// Model name; omit to validate every model
        model: Option<String>,
    },

    /// Manage model configurations
    Models {
        #[command(subcommand)]
        action: models_cmd::ModelsCommands,
    },

    /// Show recent request log entries
    Logs {
        /// Only show entries for this model
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of entries
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show settings and store status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            model,
            message,
            user,
            extras,
            logs,
        } => {
            init_logging(logs);
            run_prompt(&model, message, user, extras).await
        }
        Commands::Validate { model } => {
            init_logging(false);
            validate(model.as_deref())
        }
        Commands::Models { action } => {
            init_logging(false);
            models_cmd::dispatch(action)
        }
        Commands::Logs { model, limit } => {
            init_logging(false);
            logs_cmd::run(model.as_deref(), limit)
        }
        Commands::Status => {
            init_logging(false);
            status::run()
        }
    }
}

// ─────────────────────────────────────────────
// Run command
// ─────────────────────────────────────────────

async fn run_prompt(
    model_name: &str,
    message: Option<String>,
    user: Option<String>,
    extras: Option<String>,
) -> Result<()> {
    let settings = load_settings(None);
    let stores = helpers::open_stores(&settings)?;
    let model = StoredModel::open(stores.models.clone(), stores.requests.clone(), model_name)
        .with_context(|| format!("unknown model '{model_name}'"))?;

    let record = model.record()?;
    if !record.enabled {
        eprintln!(
            "{} model '{}' is disabled{}",
            "warning:".yellow().bold(),
            model_name,
            record
                .disabled_reason()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default()
        );
    }

    let extras = match extras {
        Some(raw) => {
            let value: serde_json::Value =
                serde_json::from_str(&raw).context("--extras must be valid JSON")?;
            Extras::from_value(value).context("invalid --extras")?
        }
        None => Extras::default(),
    };

    let backend: Arc<dyn GenerativeBackend> =
        Arc::new(ChatDispatcher::new(&settings, PromptTransformers::new())?);
    let user = user.unwrap_or_else(|| settings.default_user.clone());

    info!(model = model_name, backend = backend.kind(), "dispatching prompt");
    let reply = backend
        .run(&model, message.as_deref(), &user, extras)
        .await
        .with_context(|| format!("model '{model_name}' failed"))?;

    helpers::print_response(model_name, &reply);
    Ok(())
}

// ─────────────────────────────────────────────
// Validate command
// ─────────────────────────────────────────────

fn validate(model_name: Option<&str>) -> Result<()> {
    let settings = load_settings(None);
    let stores = helpers::open_stores(&settings)?;

    let names: Vec<String> = match model_name {
        Some(name) => vec![name.to_string()],
        None => stores.models.list().into_iter().map(|r| r.name).collect(),
    };

    if names.is_empty() {
        println!("  No models configured. Add one with `simplegen models add <NAME>`.");
        return Ok(());
    }

    let mut failing = 0;
    println!();
    for name in &names {
        let model = StoredModel::open(stores.models.clone(), stores.requests.clone(), name)
            .with_context(|| format!("unknown model '{name}'"))?;
        let issues = model_issues(&model);

        if issues.is_empty() {
            println!("  {} {}", "✓".green(), name.bold());
        } else {
            failing += 1;
            println!("  {} {}", "✗".red(), name.bold());
            for issue in &issues {
                println!("      {}", issue.dimmed());
            }
        }
    }
    println!();

    if failing > 0 {
        anyhow::bail!("{failing} model(s) have configuration issues");
    }
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("simplegen=debug,simplegen_core=debug,simplegen_providers=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
