//! Validate command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use ekey_core::MappingTable;
use tracing::info;

/// Execute the validate command.
pub fn execute(path: PathBuf) -> Result<()> {
    let mapping = MappingTable::load(&path)
        .with_context(|| format!("Invalid mapping export: {}", path.display()))?;
    let summary = mapping.summary();

    info!(
        path = %path.display(),
        users = summary.users,
        devices = summary.devices,
        "Mapping validated"
    );

    println!();
    println!("{}", "╔════════════════════════════════════════╗".green());
    println!(
        "{}",
        "║            MAPPING VALID               ║".green().bold()
    );
    println!("{}", "╚════════════════════════════════════════╝".green());
    println!();
    println!("   {} {}", "System:".dimmed(), summary.system);
    println!("   {} {}", "Users:".dimmed(), summary.users);
    println!("   {} {}", "Devices:".dimmed(), summary.devices);

    if !mapping.is_empty() {
        println!();
        for (user_id, user_name) in mapping.users() {
            println!("   {} {} {}", user_id.dimmed(), "→".dimmed(), user_name);
        }
    }
    println!();

    Ok(())
}
