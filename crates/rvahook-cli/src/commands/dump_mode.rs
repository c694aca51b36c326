//! Dump mode command implementation.

use anyhow::{Context, Result};
use rvahook::Settings;

use crate::cli::Toggle;

/// Print the stored dump mode, or store a new one
pub fn run(settings: &Settings, state: Option<Toggle>) -> Result<()> {
    let store = settings.config_store();

    let enabled = match state {
        Some(toggle) => {
            store
                .save_dump_mode(toggle.enabled())
                .context("Failed to save dump mode")?;
            toggle.enabled()
        }
        None => {
            store
                .try_load_config()
                .with_context(|| format!("Failed to read {}", settings.relay.path.display()))?
                .dump_mode
        }
    };

    println!("Dump mode: {}", if enabled { "on" } else { "off" });
    Ok(())
}
