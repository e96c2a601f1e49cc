//! dagcar CLI Binary

use anyhow::Context;
use clap::Parser;
use dagcar::logging::init_logging;
use dagcar::tooling::cli::{Cli, CliContext};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let context =
        CliContext::new(cli.config.clone()).context("Failed to load configuration")?;
    let logging = cli.logging_overrides(&context.config().logging);
    init_logging(Some(&logging)).context("Failed to initialize logging")?;

    let output = context.execute(&cli.command)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
