//! Cinescope CLI - Command-line interface
//!
//! Search the catalog, inspect titles and seasons, manage the watchlist and
//! list playback URLs.

mod commands;

use clap::Parser;
use cinescope_core::CinescopeConfig;
use cinescope_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "cinescope")]
#[command(about = "Discover movies and series, keep a watchlist, find where to play them")]
struct Cli {
    /// Use the offline demo catalog instead of TMDB
    #[arg(long, global = true)]
    demo: bool,

    /// Console log level
    #[arg(long, value_enum, global = true, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), None)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let config = CinescopeConfig::load().await?;

    if let Err(error) = commands::handle_command(cli.command, config, cli.demo).await {
        eprintln!("Error: {}", error.user_message());
        return Err(error.into());
    }

    Ok(())
}
