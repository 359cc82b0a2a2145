//! `simplegen status` — show settings and store status.

use anyhow::Result;
use colored::Colorize;

use simplegen_core::config::{get_settings_path, load_settings};

use crate::helpers::open_stores;

/// Run the status command.
pub fn run() -> Result<()> {
    let settings = load_settings(None);
    let settings_path = get_settings_path();

    println!();
    println!("{}", "simplegen status".cyan().bold());
    println!();

    println!(
        "  {:<14} {} {}",
        "Settings:".bold(),
        settings_path.display(),
        if settings_path.exists() {
            "✓".green().to_string()
        } else {
            "(defaults)".dimmed().to_string()
        }
    );
    println!("  {:<14} {}", "API base:".bold(), settings.api_base);
    println!("  {:<14} {}s", "Timeout:".bold(), settings.timeout_secs);
    println!("  {:<14} {}", "Default user:".bold(), settings.default_user);

    let stores = open_stores(&settings)?;
    println!(
        "  {:<14} {}",
        "Data dir:".bold(),
        stores
            .models
            .path()
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    );

    // Models
    let records = stores.models.list();
    let disabled = records.iter().filter(|r| !r.enabled).count();
    println!();
    println!(
        "  {:<14} {} configured, {}",
        "Models:".bold(),
        records.len(),
        if disabled == 0 {
            "none disabled".green().to_string()
        } else {
            format!("{disabled} disabled").red().to_string()
        }
    );

    // Request log
    let failed = stores
        .requests
        .list(None, usize::MAX)
        .iter()
        .filter(|e| !e.successful)
        .count();
    println!(
        "  {:<14} {} entries ({} unsuccessful)",
        "Request log:".bold(),
        stores.requests.len(),
        failed
    );
    let skipped = stores.requests.skipped();
    if skipped > 0 {
        println!(
            "  {:<14} {}",
            "",
            format!("{skipped} unreadable line(s) kept as-is").yellow()
        );
    }
    println!();

    Ok(())
}
