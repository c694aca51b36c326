//! Shared-file relay.
//!
//! Rows live in a JSON document that every process can read. The configuring
//! process is the only writer; each write goes to a temporary file in the
//! same directory which is then renamed over the document.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::relay::{ConfigRow, Relay, upsert_row};
use crate::error::{Error, Result};

/// Default document name
pub const DEFAULT_RELAY_FILE: &str = "hook_config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RelayDocument {
    rows: Vec<ConfigRow>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct FileRelay {
    path: PathBuf,
}

impl FileRelay {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time of the last write, if the document exists and records one.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.read_document().ok().and_then(|doc| doc.updated_at)
    }

    fn read_document(&self) -> Result<RelayDocument> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Relay file {} not written yet", self.path.display());
                return Ok(RelayDocument::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn write_document(&self, document: &RelayDocument) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        write_json_atomic(&self.path, document)
    }
}

/// Write `value` as JSON to a temporary file next to `path`, then rename it
/// over `path`. Readers see the old or the new content, never a partial one.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl Relay for FileRelay {
    fn query(&self) -> Result<Vec<ConfigRow>> {
        Ok(self.read_document()?.rows)
    }

    fn upsert(&self, key: &str, value: &str) -> Result<()> {
        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(Error::Json(e)) => {
                warn!(
                    "Relay file {} is corrupted ({}), rewriting it",
                    self.path.display(),
                    e
                );
                RelayDocument::default()
            }
            Err(e) => return Err(e),
        };

        upsert_row(&mut document.rows, key, value);
        document.updated_at = Some(Utc::now());
        self.write_document(&document)?;
        debug!("Wrote {}={:?} to {}", key, value, self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
