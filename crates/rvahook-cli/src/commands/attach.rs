//! Attach command implementation.
//!
//! Runs the same sequence a hooked process runs on attach, in this process,
//! so a native library can be checked against the stored configuration.

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use rvahook::{AttachOutcome, AttachReport, AttachSequencer, DylibBridge, Settings, format_offsets};
use tracing::debug;

/// Run the attach sequence for `package` and print every step
pub fn run(settings: &Settings, package: &str, library: Option<&str>) -> Result<()> {
    let mut settings = settings.clone();
    if let Some(library) = library {
        debug!("Overriding native library with {}", library);
        settings.native_library = library.to_string();
    }

    let sequencer = AttachSequencer::from_settings(&settings);
    match sequencer.run(package, DylibBridge::new()) {
        AttachOutcome::SelfExcluded => {
            println!("{} is the configuring application, nothing attached", package);
            Ok(())
        }
        AttachOutcome::AlreadyAttached => {
            println!("Already attached in this process");
            Ok(())
        }
        AttachOutcome::Attached(report) => {
            print_report(&report);
            if !report.is_complete() {
                bail!("Attach sequence for {} finished with failures", package);
            }
            Ok(())
        }
    }
}

fn print_report(report: &AttachReport) {
    println!("{} {}", "Package:".bold(), report.package);
    for (step, outcome) in report.steps() {
        match outcome {
            Ok(()) => println!("  {:<16} {}", step.to_string(), "ok".green()),
            Err(e) => println!("  {:<16} {} ({})", step.to_string(), "failed".red(), e),
        }
    }
    if let Some(config) = &report.config {
        println!(
            "{} [{}]",
            "Targets:".bold(),
            format_offsets(&config.targets).join(", ")
        );
        println!(
            "{} {}",
            "Dump mode:".bold(),
            if config.dump_mode { "on" } else { "off" }
        );
    }
    if report.enabled_packages.len() > 1 {
        println!(
            "{} several packages selected: {}",
            "warning:".yellow(),
            report
                .enabled_packages
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!("{} {}", "State:".bold(), report.state());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvahook::config::DEFAULT_SELF_PACKAGE;
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> Settings {
        Settings::builder()
            .relay_path(dir.path().join("relay.json"))
            .native_library(
                dir.path()
                    .join("missing_native_hook.so")
                    .to_string_lossy()
                    .into_owned(),
            )
            .build()
    }

    #[test]
    fn test_self_package_is_skipped() {
        let dir = TempDir::new().unwrap();
        assert!(run(&settings(&dir), DEFAULT_SELF_PACKAGE, None).is_ok());
    }

    #[test]
    fn test_missing_library_reports_failure() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        settings.config_store().save_targets(&[0x1234]).unwrap();

        let err = run(&settings, "com.example.game", None).unwrap_err();
        assert!(err.to_string().contains("com.example.game"));
    }
}
