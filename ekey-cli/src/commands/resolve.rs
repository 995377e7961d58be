//! Resolve command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ekey_core::{FingerEvent, MappingTable, ResolvedEvent};
use tracing::debug;

/// Execute the resolve command: print the event the bridge would publish.
pub fn execute(mapping_path: PathBuf, event_path: PathBuf) -> Result<()> {
    let mapping = MappingTable::load(&mapping_path)
        .with_context(|| format!("Invalid mapping export: {}", mapping_path.display()))?;

    let body = std::fs::read(&event_path)
        .with_context(|| format!("Failed to read event file: {}", event_path.display()))?;
    debug!(path = %event_path.display(), bytes = body.len(), "Read event");

    let event = FingerEvent::from_slice(&body)
        .with_context(|| format!("Invalid notification: {}", event_path.display()))?;

    let resolved = ResolvedEvent::resolve(&event, &mapping);
    if resolved.user_id.is_some() && !resolved.user_is_mapped {
        debug!(user = resolved.display_user(), "User not in mapping, kept raw id");
    }

    let json = serde_json::to_string_pretty(&resolved).context("Failed to serialize event")?;
    println!("{json}");
    Ok(())
}
