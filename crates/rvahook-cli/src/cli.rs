//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rvahook::config::DEFAULT_SETTINGS_FILE;

#[derive(Parser)]
#[command(name = "rvahook")]
#[command(version)]
#[command(about = "Configure hook targets for the native instrumentation layer")]
pub struct Cli {
    /// Settings file
    #[arg(short, long, global = true, env = "RVAHOOK_CONFIG", default_value = DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the canonical form of offsets (hex with 0x, or decimal)
    Parse {
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Extract hook targets from a decompiled method dump
    Extract {
        /// Dump file (e.g. dump.cs)
        dump: PathBuf,

        /// Maximum number of targets to extract
        #[arg(short, long)]
        max: Option<usize>,

        /// Replace the stored target list with the result
        #[arg(long)]
        save: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Inspect or edit the stored target list
    Targets {
        #[command(subcommand)]
        action: TargetsAction,
    },

    /// Show or set dump mode
    DumpMode {
        state: Option<Toggle>,
    },

    /// Show the stored configuration
    Show {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Run the attach sequence in this process against the native library
    Attach {
        /// Package identifier of the process being attached
        #[arg(short, long)]
        package: String,

        /// Native library name or path (overrides the settings file)
        #[arg(short, long)]
        library: Option<String>,
    },

    /// Write a settings file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum TargetsAction {
    /// List stored targets
    List,
    /// Add targets
    Add {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Remove targets
    Remove {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Replace the target at a position shown by `list`
    Edit { position: usize, value: String },
    /// Remove every target
    Clear,
    /// Restore the built-in default target
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}
