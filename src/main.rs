use anyhow::Result;
use clap::{Parser, Subcommand};
use itinera_core::{config::Config, migration, server, telemetry};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the database if needed and apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    telemetry::init(&config.telemetry);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => migration::run_migrations(&config).await,
        Command::Serve => {
            info!("Starting Itinera Core Service");
            info!("HTTP server listening on {}", config.http_addr());
            server::run(config).await
        }
    }
}
