use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One stored key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRow {
    pub key: String,
    pub value: String,
}

impl ConfigRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Transport that makes configuration rows visible across processes.
///
/// A relay only offers a full projection of its rows and single-row upserts.
/// Implementations must replace a row atomically so concurrent readers see
/// either the old or the new value, never a mix.
pub trait Relay: Send + Sync {
    /// Return every stored row.
    fn query(&self) -> Result<Vec<ConfigRow>>;

    /// Insert or replace the row for `key`.
    fn upsert(&self, key: &str, value: &str) -> Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// In-process relay, for hosts that configure and hook in the same process.
#[derive(Debug, Default)]
pub struct MemoryRelay {
    rows: RwLock<Vec<ConfigRow>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows<I: IntoIterator<Item = ConfigRow>>(rows: I) -> Self {
        Self {
            rows: RwLock::new(rows.into_iter().collect()),
        }
    }
}

impl Relay for MemoryRelay {
    fn query(&self) -> Result<Vec<ConfigRow>> {
        Ok(self.rows.read().clone())
    }

    fn upsert(&self, key: &str, value: &str) -> Result<()> {
        upsert_row(&mut self.rows.write(), key, value);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Replace the first row with `key`, or append one.
pub(crate) fn upsert_row(rows: &mut Vec<ConfigRow>, key: &str, value: &str) {
    match rows.iter_mut().find(|row| row.key == key) {
        Some(row) => row.value = value.to_string(),
        None => rows.push(ConfigRow::new(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_relay_upsert_is_last_write_wins() {
        let relay = MemoryRelay::new();
        relay.upsert("rvas", "0x1").unwrap();
        relay.upsert("dump_mode", "0").unwrap();
        relay.upsert("rvas", "0x2").unwrap();
        relay.upsert("rvas", "0x2").unwrap();

        let rows = relay.query().unwrap();
        assert_eq!(
            rows,
            vec![ConfigRow::new("rvas", "0x2"), ConfigRow::new("dump_mode", "0")]
        );
    }

    #[test]
    fn test_upsert_row_touches_first_match_only() {
        let mut rows = vec![ConfigRow::new("k", "a"), ConfigRow::new("k", "b")];
        upsert_row(&mut rows, "k", "c");
        assert_eq!(rows[0].value, "c");
        assert_eq!(rows[1].value, "b");
    }
}
