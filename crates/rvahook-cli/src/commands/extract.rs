//! Extract command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use rvahook::{DumpExtractor, Settings, TargetList};

use crate::cli::OutputFormat;

/// Extract set_Text targets from a dump file, optionally replacing the stored list
pub fn run(
    settings: &Settings,
    dump: &Path,
    max: Option<usize>,
    save: bool,
    format: OutputFormat,
) -> Result<()> {
    let extractor = max.map_or_else(|| settings.extractor(), DumpExtractor::new);
    let found = extractor
        .extract_from_path(dump)
        .with_context(|| format!("Failed to read dump file {}", dump.display()))?;

    match format {
        OutputFormat::Text => {
            if found.is_empty() {
                eprintln!("No set_Text targets found in {}", dump.display());
            }
            for (i, text) in found.iter().enumerate() {
                println!("#{:<3} {}", i + 1, text);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&found)?),
    }

    if save && !found.is_empty() {
        let targets = save_found(settings, &found)?;
        eprintln!(
            "Saved {} targets to {}",
            targets.len(),
            settings.relay.path.display()
        );
    }

    Ok(())
}

fn save_found(settings: &Settings, found: &[String]) -> Result<TargetList> {
    let targets = TargetList::from_texts(found);
    settings
        .config_store()
        .save_targets(targets.as_slice())
        .context("Failed to save targets")?;
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DUMP: &str = "\
// RVA: 0x1A2B Offset: 0x0 VA: 0x0
public void set_Text(string value) { }
// RVA: 0x3C4D Offset: 0x0 VA: 0x0
public string get_Text() { }
";

    fn settings(dir: &TempDir) -> Settings {
        Settings::builder()
            .relay_path(dir.path().join("relay.json"))
            .build()
    }

    #[test]
    fn test_extract_and_save() {
        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("dump.cs");
        fs::write(&dump, DUMP).unwrap();
        let settings = settings(&dir);

        run(&settings, &dump, None, true, OutputFormat::Json).unwrap();

        assert_eq!(settings.config_store().load_targets(), vec![0x1a2b]);
    }

    #[test]
    fn test_empty_result_keeps_stored_targets() {
        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("dump.cs");
        fs::write(&dump, "nothing here\n").unwrap();
        let settings = settings(&dir);
        settings.config_store().save_targets(&[0x10]).unwrap();

        run(&settings, &dump, None, true, OutputFormat::Text).unwrap();

        assert_eq!(settings.config_store().load_targets(), vec![0x10]);
    }

    #[test]
    fn test_missing_dump_is_an_error() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        let err = run(
            &settings,
            &dir.path().join("missing.cs"),
            Some(5),
            false,
            OutputFormat::Text,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing.cs"));
    }
}
