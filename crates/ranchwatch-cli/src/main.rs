mod banner;
mod migrate;
mod wizard;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ranchwatch_config::ConfigLoader;
use ranchwatch_gateway::{AppState, GatewayServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ranchwatch", version, about = "Community fire alert backend")]
struct Cli {
    /// Directory containing config.yml / config.toml
    #[arg(long, global = true, env = "RANCHWATCH_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile the database schema and start the HTTP gateway
    Start {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Bring an existing database up to date and print what changed
    Migrate,
    /// Interactive setup: writes config.yml
    Init,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let loader = match cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };

    match cli.command {
        Command::Init => wizard::run_wizard(loader.config_dir()),
        Command::Migrate => {
            let config = loader.load().context("failed to load config")?;
            migrate::run(&config)
        }
        Command::Start { host, port } => {
            let mut config = loader.load().context("failed to load config")?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }

            let state = AppState::initialize(config).context("startup failed")?;
            banner::print_banner(&state, loader.config_dir());

            info!("starting gateway");
            GatewayServer::new(Arc::new(state))
                .run()
                .await
                .context("gateway stopped")?;
            Ok(())
        }
    }
}
