//! pkgrisk - rank distribution packages by security review priority

use anyhow::Result;
use clap::Parser;
use pkgrisk::cli::{self, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    cli::run(cli)
}
