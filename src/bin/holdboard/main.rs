//! holdboard CLI entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use holdboard::ServerBuilder;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("holdboard v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.into_config()?;

    let mut server = ServerBuilder::new(config).build().await?;
    server.run().await?;

    info!("Goodbye!");
    Ok(())
}
