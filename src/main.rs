use anyhow::Result;
use clap::Parser;
use photo_poem_service::models::Config;
use photo_poem_service::server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "photo-poem-service")]
#[command(about = "Poem recommendation backend for photo uploads")]
struct CliArgs {
    /// Override the bind host (defaults to SERVER_HOST or 0.0.0.0).
    #[arg(long)]
    host: Option<String>,
    /// Override the bind port (defaults to SERVER_PORT or 3001).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photo_poem_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting photo-poem-service");

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    if let Err(e) = server::serve(&config).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
