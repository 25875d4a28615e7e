mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{Cli, Command};
use libdocloop_core::DocloopError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = run_command(&cli) {
        output::fail(&cli, &e);
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_command(cli: &Cli) -> Result<(), DocloopError> {
    match &cli.command {
        Command::Init { force } => commands::init::run(cli, *force),
        Command::Track { file, meta } => commands::track::run(cli, file, meta),
        Command::Versions { file } => commands::versions::run(cli, file),
        Command::Diff { file, out } => commands::diff::run(cli, file, out.as_deref()),
        Command::Session { cmd } => commands::session::run(cli, cmd.clone()),
    }
}
