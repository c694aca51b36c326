use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};
use tracing::{debug, warn};

use super::file::FileRelay;
use super::relay::{ConfigRow, Relay};
use crate::error::{Error, Result};
use crate::offset::{format_offset, parse_offset};

/// Row key holding the comma-joined target list
pub const KEY_TARGETS: &str = "rvas";
/// Row key holding the dump mode flag
pub const KEY_DUMP_MODE: &str = "dump_mode";

/// Upper bound on a cross-process read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Decoded configuration as seen by a hooked process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookConfig {
    pub targets: Vec<u64>,
    pub dump_mode: bool,
}

impl HookConfig {
    /// Decode from a row set. The first row for each key wins.
    pub fn from_rows(rows: &[ConfigRow]) -> Self {
        Self {
            targets: find_value(rows, KEY_TARGETS)
                .map(decode_targets)
                .unwrap_or_default(),
            dump_mode: decode_dump_mode(find_value(rows, KEY_DUMP_MODE)),
        }
    }
}

/// Read/write contract over a relay.
///
/// Writes go straight to the relay. Reads run on a helper thread and give
/// up after the read timeout, so a stalled transport cannot hang the caller.
#[derive(Clone)]
pub struct ConfigStore {
    relay: Arc<dyn Relay>,
    read_timeout: Duration,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("relay", &self.relay.describe())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

impl ConfigStore {
    pub fn new(relay: Arc<dyn Relay>) -> Self {
        Self {
            relay,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Store backed by a shared JSON file.
    pub fn open_file<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(Arc::new(FileRelay::new(path)))
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Upsert one row.
    pub fn write(&self, key: &str, value: &str) -> Result<()> {
        self.relay.upsert(key, value)
    }

    /// Fetch every row, bounded by the read timeout.
    pub fn read_all(&self) -> Result<Vec<ConfigRow>> {
        let relay = Arc::clone(&self.relay);
        let (tx, rx) = bounded(1);

        thread::Builder::new()
            .name("rvahook-relay-read".to_string())
            .spawn(move || {
                // receiver may have given up already
                let _ = tx.send(relay.query());
            })?;

        match rx.recv_timeout(self.read_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::RelayTimeout(self.read_timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(Error::RelayUnavailable(format!(
                "query against {} aborted",
                self.relay.describe()
            ))),
        }
    }

    pub fn save_targets(&self, targets: &[u64]) -> Result<()> {
        self.write(KEY_TARGETS, &encode_targets(targets))
    }

    /// Stored target list. Never fails: an unreadable relay or malformed
    /// entries leave a partial or empty list.
    pub fn load_targets(&self) -> Vec<u64> {
        self.load_config().targets
    }

    pub fn save_dump_mode(&self, enabled: bool) -> Result<()> {
        self.write(KEY_DUMP_MODE, encode_dump_mode(enabled))
    }

    /// Stored dump mode flag; `false` when absent or unreadable.
    pub fn load_dump_mode(&self) -> bool {
        self.load_config().dump_mode
    }

    /// Read both keys with one relay round trip, surfacing relay errors.
    pub fn try_load_config(&self) -> Result<HookConfig> {
        let rows = self.read_all()?;
        let config = HookConfig::from_rows(&rows);
        debug!(
            "Loaded {} targets (dump_mode={}) from {}",
            config.targets.len(),
            config.dump_mode,
            self.relay.describe()
        );
        Ok(config)
    }

    /// Read both keys, falling back to an empty configuration on any error.
    pub fn load_config(&self) -> HookConfig {
        self.try_load_config().unwrap_or_else(|e| {
            if e.is_unreachable() {
                warn!(
                    "Config relay {} unreachable, using empty configuration: {}",
                    self.relay.describe(),
                    e
                );
            } else {
                warn!(
                    "Config relay {} returned unreadable data, using empty configuration: {}",
                    self.relay.describe(),
                    e
                );
            }
            HookConfig::default()
        })
    }
}

/// Serialize targets in canonical form, comma-joined.
pub fn encode_targets(targets: &[u64]) -> String {
    targets
        .iter()
        .map(|&t| format_offset(t))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a stored target list, dropping blank and malformed entries.
pub fn decode_targets(raw: &str) -> Vec<u64> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(parse_offset)
        .collect()
}

pub fn encode_dump_mode(enabled: bool) -> &'static str {
    if enabled { "1" } else { "0" }
}

/// `"1"` or any-case `"true"` is on; anything else, or nothing, is off.
pub fn decode_dump_mode(raw: Option<&str>) -> bool {
    raw.map(str::trim)
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn find_value<'a>(rows: &'a [ConfigRow], key: &str) -> Option<&'a str> {
    rows.iter()
        .find(|row| row.key == key)
        .map(|row| row.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRelay;
    use std::time::Instant;
    use tempfile::TempDir;

    fn memory_store() -> ConfigStore {
        ConfigStore::new(Arc::new(MemoryRelay::new()))
    }

    fn store_with(rows: Vec<ConfigRow>) -> ConfigStore {
        ConfigStore::new(Arc::new(MemoryRelay::with_rows(rows)))
    }

    struct FailingRelay;

    impl Relay for FailingRelay {
        fn query(&self) -> Result<Vec<ConfigRow>> {
            Err(Error::RelayUnavailable("provider not installed".to_string()))
        }

        fn upsert(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::RelayUnavailable("provider not installed".to_string()))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    struct StalledRelay(Duration);

    impl Relay for StalledRelay {
        fn query(&self) -> Result<Vec<ConfigRow>> {
            thread::sleep(self.0);
            Ok(vec![ConfigRow::new(KEY_TARGETS, "0x1")])
        }

        fn upsert(&self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        fn describe(&self) -> String {
            "stalled".to_string()
        }
    }

    struct PanickingRelay;

    impl Relay for PanickingRelay {
        fn query(&self) -> Result<Vec<ConfigRow>> {
            panic!("transport bug");
        }

        fn upsert(&self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        fn describe(&self) -> String {
            "panicking".to_string()
        }
    }

    #[test]
    fn test_save_and_load_targets_preserves_order() {
        let store = memory_store();
        store.save_targets(&[4660, 291]).unwrap();
        assert_eq!(store.load_targets(), vec![0x1234, 0x123]);
        assert_eq!(
            store.read_all().unwrap(),
            vec![ConfigRow::new(KEY_TARGETS, "0x1234,0x123")]
        );
    }

    #[test]
    fn test_load_targets_accepts_decimal_and_spaces() {
        let store = store_with(vec![ConfigRow::new(KEY_TARGETS, " 4660 , 0x123,,")]);
        assert_eq!(store.load_targets(), vec![4660, 291]);
    }

    #[test]
    fn test_load_targets_empty_or_corrupted() {
        assert!(memory_store().load_targets().is_empty());
        assert!(store_with(vec![ConfigRow::new(KEY_TARGETS, "")]).load_targets().is_empty());
        assert!(store_with(vec![ConfigRow::new(KEY_TARGETS, "   ")]).load_targets().is_empty());
        assert!(
            store_with(vec![ConfigRow::new(KEY_TARGETS, "garbage;;0xZZ")])
                .load_targets()
                .is_empty()
        );
        assert_eq!(
            store_with(vec![ConfigRow::new(KEY_TARGETS, "0x10,oops,32")]).load_targets(),
            vec![0x10, 32]
        );
    }

    #[test]
    fn test_load_dump_mode_values() {
        assert!(!memory_store().load_dump_mode());
        for (raw, expected) in [
            ("1", true),
            ("true", true),
            ("TRUE", true),
            ("0", false),
            ("false", false),
            ("yes", false),
            ("", false),
        ] {
            let store = store_with(vec![ConfigRow::new(KEY_DUMP_MODE, raw)]);
            assert_eq!(store.load_dump_mode(), expected, "raw {:?}", raw);
        }
    }

    #[test]
    fn test_save_dump_mode_writes_literal() {
        let store = memory_store();
        store.save_dump_mode(true).unwrap();
        assert_eq!(store.read_all().unwrap(), vec![ConfigRow::new(KEY_DUMP_MODE, "1")]);
        store.save_dump_mode(false).unwrap();
        assert_eq!(store.read_all().unwrap(), vec![ConfigRow::new(KEY_DUMP_MODE, "0")]);
        assert!(!store.load_dump_mode());
    }

    #[test]
    fn test_first_row_per_key_wins() {
        let store = store_with(vec![
            ConfigRow::new("other", "x"),
            ConfigRow::new(KEY_TARGETS, "0x1"),
            ConfigRow::new(KEY_TARGETS, "0x2"),
        ]);
        assert_eq!(store.load_targets(), vec![1]);
    }

    #[test]
    fn test_unreachable_relay_degrades_to_empty() {
        let store = ConfigStore::new(Arc::new(FailingRelay));
        assert_eq!(store.load_config(), HookConfig::default());
        assert!(store.load_targets().is_empty());
        assert!(!store.load_dump_mode());
        assert!(store.try_load_config().unwrap_err().is_unreachable());
        assert!(store.save_targets(&[1]).is_err());
    }

    #[test]
    fn test_read_timeout_degrades_to_empty() {
        let store = ConfigStore::new(Arc::new(StalledRelay(Duration::from_secs(2))))
            .with_read_timeout(Duration::from_millis(50));

        let started = Instant::now();
        assert!(matches!(store.read_all(), Err(Error::RelayTimeout(_))));
        assert!(store.load_targets().is_empty());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_panicking_relay_degrades_to_empty() {
        let store = ConfigStore::new(Arc::new(PanickingRelay));
        assert!(matches!(store.read_all(), Err(Error::RelayUnavailable(_))));
        assert!(store.load_targets().is_empty());
    }

    #[test]
    fn test_file_backed_store_across_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hook_config.json");

        let writer = ConfigStore::open_file(&path);
        writer.save_targets(&[0x1d236e8, 0x10]).unwrap();
        writer.save_dump_mode(true).unwrap();

        let reader = ConfigStore::open_file(&path);
        assert_eq!(
            reader.load_config(),
            HookConfig {
                targets: vec![0x1d236e8, 0x10],
                dump_mode: true,
            }
        );
    }

    #[test]
    fn test_encode_decode_targets() {
        assert_eq!(encode_targets(&[]), "");
        assert_eq!(encode_targets(&[1, 0xabc]), "0x1,0xabc");
        assert_eq!(decode_targets(&encode_targets(&[7, u64::MAX])), vec![7, u64::MAX]);
    }
}
