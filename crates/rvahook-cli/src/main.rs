mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use rvahook::Settings;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "rvahook=debug"
    } else {
        "rvahook=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    if let Command::InitConfig { force } = cli.command {
        return commands::init_config::run(&cli.config, force);
    }

    let settings = Settings::load_or_default(&cli.config);

    match cli.command {
        Command::Parse { inputs } => commands::parse::run(&inputs),
        Command::Extract {
            dump,
            max,
            save,
            format,
        } => commands::extract::run(&settings, &dump, max, save, format),
        Command::Targets { action } => commands::targets::run(&settings, action),
        Command::DumpMode { state } => commands::dump_mode::run(&settings, state),
        Command::Show { format } => commands::show::run(&settings, format),
        Command::Attach { package, library } => {
            commands::attach::run(&settings, &package, library.as_deref())
        }
        Command::InitConfig { .. } => Ok(()),
    }
}
