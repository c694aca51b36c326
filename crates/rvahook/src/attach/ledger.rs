//! Record of packages that have run the attach sequence.
//!
//! The ledger is advisory: it only feeds the "several targets selected"
//! warning. It is process-local bookkeeping, separate from the shared
//! configuration, and a hooked process that cannot read or write it sees
//! only its own package.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::store::write_json_atomic;

#[derive(Debug)]
pub struct PackageLedger {
    path: Option<PathBuf>,
    local: Mutex<BTreeSet<String>>,
}

impl PackageLedger {
    /// Ledger that lives only as long as this process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            local: Mutex::new(BTreeSet::new()),
        }
    }

    /// Ledger persisted to a JSON file.
    pub fn with_file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
            local: Mutex::new(BTreeSet::new()),
        }
    }

    /// Record `package` and return every package known to have attached.
    ///
    /// Falls back to `{package}` when the ledger file cannot be used.
    pub fn mark(&self, package: &str) -> BTreeSet<String> {
        let mut local = self.local.lock();
        local.insert(package.to_string());

        let Some(path) = &self.path else {
            return local.clone();
        };

        match mark_in_file(path, &local) {
            Ok(packages) => packages,
            Err(e) => {
                debug!(
                    "Package ledger {} unavailable ({}), reporting {} only",
                    path.display(),
                    e,
                    package
                );
                BTreeSet::from([package.to_string()])
            }
        }
    }
}

impl Default for PackageLedger {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn mark_in_file(path: &Path, packages: &BTreeSet<String>) -> Result<BTreeSet<String>> {
    let mut known: BTreeSet<String> = match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
        Err(e) => return Err(e.into()),
    };
    known.extend(packages.iter().cloned());
    write_json_atomic(path, &known)?;
    Ok(known)
}
