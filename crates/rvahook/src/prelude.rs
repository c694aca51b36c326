//! Prelude module for convenient imports
//!
//! ```ignore
//! use rvahook::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Offsets: `TargetList`, `DumpExtractor`, `parse_offset`, `format_offset`
//! - Storage: `ConfigStore`, `HookConfig`, `Relay`, `FileRelay`, `MemoryRelay`
//! - Attach: `AttachSequencer`, `AttachOutcome`, `NativeBridge`, `DylibBridge`
//! - Settings and error handling: `Settings`, `Error`, `Result`

pub use crate::attach::{AttachOutcome, AttachReport, AttachSequencer, DylibBridge, NativeBridge};
pub use crate::config::Settings;
pub use crate::error::{Error, Result};
pub use crate::offset::{DumpExtractor, TargetList, format_offset, parse_offset};
pub use crate::store::{ConfigStore, FileRelay, HookConfig, MemoryRelay, Relay};
