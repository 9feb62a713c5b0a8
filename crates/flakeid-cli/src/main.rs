mod cli;
mod generate;
mod inspect;

use crate::cli::{Command, CLI};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // stdout carries ids only; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = CLI::parse();

    match &config.command {
        Command::Generate(args) => generate::run(args),
        Command::Decompose(args) => inspect::run(args),
    }
}
