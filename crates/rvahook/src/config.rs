//! Settings shared by the configuring tool and the in-process hook.
//!
//! Settings are read from a TOML file:
//!
//! ```toml
//! self_package = "com.tools.rvahook"
//! native_library = "native_hook"
//! default_target = "0x1d236e8"
//!
//! [relay]
//! path = "hook_config.json"
//! read_timeout_ms = 3000
//!
//! [extract]
//! max_results = 100
//!
//! [ledger]
//! path = "/data/local/tmp/rvahook-packages.json"
//! ```
//!
//! Every field is optional; missing ones take their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attach::PackageLedger;
use crate::error::Result;
use crate::offset::{DEFAULT_MAX_RESULTS, DEFAULT_TARGET, DumpExtractor, format_offset, parse_offset};
use crate::store::{ConfigStore, DEFAULT_READ_TIMEOUT, DEFAULT_RELAY_FILE};

/// Default settings file name
pub const DEFAULT_SETTINGS_FILE: &str = "rvahook.toml";

/// Package identifier of the configuring application
pub const DEFAULT_SELF_PACKAGE: &str = "com.tools.rvahook";

/// Native instrumentation library, without platform prefix/suffix
pub const DEFAULT_NATIVE_LIBRARY: &str = "native_hook";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identifier of the configuring application; never instrumented
    pub self_package: String,
    /// Name of the native instrumentation library
    pub native_library: String,
    /// Seed offset used when restoring defaults
    pub default_target: String,
    pub relay: RelaySettings,
    pub extract: ExtractSettings,
    pub ledger: LedgerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Shared configuration document
    pub path: PathBuf,
    /// Bound on a cross-process read
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub max_results: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Process-local file recording attached packages; in-memory when unset
    pub path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            self_package: DEFAULT_SELF_PACKAGE.to_string(),
            native_library: DEFAULT_NATIVE_LIBRARY.to_string(),
            default_target: format_offset(DEFAULT_TARGET),
            relay: RelaySettings::default(),
            extract: ExtractSettings::default(),
            ledger: LedgerSettings::default(),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_RELAY_FILE),
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl Settings {
    /// Create a new settings builder
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) if e.is_not_found() => {
                debug!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load settings from {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings as TOML, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.relay.read_timeout_ms)
    }

    /// Seed offset, or the built-in one if the configured text is invalid
    pub fn default_target(&self) -> u64 {
        parse_offset(&self.default_target).unwrap_or_else(|| {
            warn!(
                "Invalid default_target {:?}, using {}",
                self.default_target,
                format_offset(DEFAULT_TARGET)
            );
            DEFAULT_TARGET
        })
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::open_file(self.relay.path.clone()).with_read_timeout(self.read_timeout())
    }

    pub fn extractor(&self) -> DumpExtractor {
        DumpExtractor::new(self.extract.max_results)
    }

    pub fn ledger(&self) -> PackageLedger {
        match &self.ledger.path {
            Some(path) => PackageLedger::with_file(path.clone()),
            None => PackageLedger::in_memory(),
        }
    }
}

/// Builder for Settings
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    self_package: Option<String>,
    native_library: Option<String>,
    relay_path: Option<PathBuf>,
    read_timeout: Option<Duration>,
    max_results: Option<usize>,
    ledger_path: Option<PathBuf>,
}

impl SettingsBuilder {
    pub fn self_package<S: Into<String>>(mut self, package: S) -> Self {
        self.self_package = Some(package.into());
        self
    }

    pub fn native_library<S: Into<String>>(mut self, name: S) -> Self {
        self.native_library = Some(name.into());
        self
    }

    pub fn relay_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.relay_path = Some(path.into());
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    pub fn ledger_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.ledger_path = Some(path.into());
        self
    }

    pub fn build(self) -> Settings {
        let default = Settings::default();
        Settings {
            self_package: self.self_package.unwrap_or(default.self_package),
            native_library: self.native_library.unwrap_or(default.native_library),
            default_target: default.default_target,
            relay: RelaySettings {
                path: self.relay_path.unwrap_or(default.relay.path),
                read_timeout_ms: self
                    .read_timeout
                    .map(|t| t.as_millis() as u64)
                    .unwrap_or(default.relay.read_timeout_ms),
            },
            extract: ExtractSettings {
                max_results: self.max_results.unwrap_or(default.extract.max_results),
            },
            ledger: LedgerSettings {
                path: self.ledger_path.or(default.ledger.path),
            },
        }
    }
}
