use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cw_cli::commands::{book, cancel, days, mine, schedule, slots, status};
use cw_cli::{Cli, Commands, Config, Session};

/// Load config and restore the booking table from the database.
fn open_session(config_path: Option<&Path>) -> Result<Session> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Session::open(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init so a subscriber installed by a test harness is left alone
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let session = open_session(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();
    match command {
        Commands::Days(args) => days::run(&mut stdout, args, &session)?,
        Commands::Slots(args) => slots::run(&mut stdout, args, &session)?,
        Commands::Book(args) => book::run(&mut stdout, args, &session)?,
        Commands::Cancel(args) => cancel::run(&mut stdout, args, &session)?,
        Commands::Mine(args) => mine::run(&mut stdout, args, &session)?,
        Commands::Schedule(args) => schedule::run(&mut stdout, args, &session)?,
        Commands::Status => status::run(&mut stdout, &session)?,
    }

    Ok(())
}
