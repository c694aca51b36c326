//! CLI command implementations.

pub mod attach;
pub mod dump_mode;
pub mod extract;
pub mod init_config;
pub mod parse;
pub mod show;
pub mod targets;
