//! Cross-process configuration storage.
//!
//! - **Relay**: transport trait with a full-projection read and single-row upserts
//! - **FileRelay**: shared JSON document, replaced atomically on every write
//! - **MemoryRelay**: in-process rows
//! - **ConfigStore**: encodes the target list and dump mode flag into rows and
//!   degrades to an empty configuration when the relay cannot be read
//!
//! ## Row format
//!
//! | key         | value                                   |
//! |-------------|-----------------------------------------|
//! | `rvas`      | comma-joined offsets, e.g. `0x1234,0x123` |
//! | `dump_mode` | `1` or `0`                              |

mod config_store;
mod file;
mod relay;

pub use config_store::*;
pub use file::*;
pub use relay::{ConfigRow, MemoryRelay, Relay};

pub(crate) use file::write_json_atomic;
