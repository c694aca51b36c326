//! Init-config command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use rvahook::Settings;

/// Write default settings to `path`
pub fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite", path.display());
    }
    Settings::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
