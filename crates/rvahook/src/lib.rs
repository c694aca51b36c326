//! # rvahook
//!
//! Hook target configuration for a native instrumentation layer.
//!
//! This crate provides:
//! - Offset parsing and canonical formatting
//! - Hook target extraction from decompiled method dumps
//! - A cross-process configuration store with a swappable relay transport
//! - The attach sequence that loads the native layer and pushes the
//!   current configuration into it
//! - A C entry point (`rvahook_on_attach`) for hosts that load the crate
//!   as a shared library

pub mod attach;
pub mod config;
pub mod error;
pub mod ffi;
pub mod offset;
pub mod prelude;
pub mod store;

pub use attach::{
    AttachOutcome, AttachReport, AttachSequencer, AttachState, AttachStep, DylibBridge,
    NativeBridge, PackageLedger, library_file_name,
};
pub use config::{Settings, SettingsBuilder};
pub use error::{Error, Result};
pub use offset::{
    DEFAULT_TARGET, DumpExtractor, TargetList, format_offset, format_offsets, normalize_offsets,
    parse_offset,
};
pub use store::{
    ConfigRow, ConfigStore, FileRelay, HookConfig, KEY_DUMP_MODE, KEY_TARGETS, MemoryRelay, Relay,
};
