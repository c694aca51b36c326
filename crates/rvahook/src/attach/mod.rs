//! Attach-time orchestration inside a hooked process.
//!
//! The host calls into this module once per process when the process becomes
//! eligible for instrumentation. The sequencer loads the native layer, runs
//! its initializer and hands it the current configuration; every step is
//! allowed to fail without affecting the others or the host.

mod bridge;
mod dylib;
mod ledger;
mod sequencer;

pub use bridge::NativeBridge;
pub use dylib::*;
pub use ledger::PackageLedger;
pub use sequencer::*;
