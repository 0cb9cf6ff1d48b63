use anyhow::Result;
use clap::{Parser, Subcommand};
use sm_access_core::{config::Config, migration, server, telemetry};
use tracing::info;

#[derive(Parser)]
#[command(name = "sm-access-core")]
#[command(about = "Secrets Manager access policy service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let prometheus_handle = telemetry::init(&config.telemetry)?;

    match cli.command {
        Some(Commands::Migrate) => migration::run_migrations(&config).await,
        Some(Commands::Serve) | None => {
            info!("Starting SM Access Core");
            info!("HTTP server listening on {}", config.http_addr());
            server::run(config, prometheus_handle).await
        }
    }
}
