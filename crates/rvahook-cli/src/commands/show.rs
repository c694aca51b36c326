//! Show command implementation.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use rvahook::{FileRelay, HookConfig, Settings, format_offsets};

use crate::cli::OutputFormat;

/// Print the stored configuration
pub fn run(settings: &Settings, format: OutputFormat) -> Result<()> {
    let config = settings
        .config_store()
        .try_load_config()
        .with_context(|| format!("Failed to read {}", settings.relay.path.display()))?;
    let relay = FileRelay::new(settings.relay.path.clone());

    match format {
        OutputFormat::Text => print_text(settings, &relay, &config),
        OutputFormat::Json => {
            let view = serde_json::json!({
                "relay": relay.path(),
                "updated_at": relay.updated_at(),
                "targets": format_offsets(&config.targets),
                "dump_mode": config.dump_mode,
                "native_library": settings.native_library,
                "self_package": settings.self_package,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }
    Ok(())
}

fn print_text(settings: &Settings, relay: &FileRelay, config: &HookConfig) {
    println!("{} {}", "Relay:".bold(), relay.path().display());
    if let Some(updated_at) = relay.updated_at() {
        println!("{} {}", "Updated:".bold(), updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("{} {}", "Library:".bold(), settings.native_library);
    println!(
        "{} {}",
        "Dump mode:".bold(),
        if config.dump_mode {
            "on".green().to_string()
        } else {
            "off".dimmed().to_string()
        }
    );

    println!("{} ({})", "Targets".bold(), config.targets.len());
    if config.targets.is_empty() {
        println!("  {}", "none".yellow());
    }
    for (i, text) in format_offsets(&config.targets).iter().enumerate() {
        println!("  #{:<3} {}", i + 1, text.cyan());
    }
}
