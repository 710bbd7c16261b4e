use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input};
use ranchwatch_config::{AppConfig, DatabaseConfig, GatewayConfig, NotificationsConfig};
use tracing::info;

/// Run the interactive setup wizard and write config.yml.
pub fn run_wizard(config_dir: &Path) -> Result<()> {
    if !std::io::stdin().is_terminal() {
        println!("Non-interactive environment detected.");
        println!(
            "To configure RanchWatch, edit: {}/config.yml",
            config_dir.display()
        );
        println!();
        println!("Minimal config.yml example:");
        println!("---");
        println!("gateway:");
        println!("  host: 0.0.0.0");
        println!("  port: 8088");
        println!("database:");
        println!("  path: fire_alerts.db");
        println!("notifications:");
        println!("  credentials_path: firebase-key.json");
        return Ok(());
    }

    println!();
    println!("  RanchWatch Setup Wizard");
    println!("  -----------------------");
    println!();

    let defaults = AppConfig::default();

    // --- Gateway ---
    let host: String = Input::new()
        .with_prompt("Listen address")
        .default(defaults.gateway.host.clone())
        .interact_text()
        .context("host input cancelled")?;

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(defaults.gateway.port)
        .interact_text()
        .context("port input cancelled")?;

    // --- Database ---
    let db_path: String = Input::new()
        .with_prompt("Database file")
        .default(defaults.database.path.display().to_string())
        .interact_text()
        .context("database path input cancelled")?;

    // --- Push notifications ---
    let enable_push = Confirm::new()
        .with_prompt("Enable push notifications? (needs a service account key)")
        .default(false)
        .interact()
        .context("notification choice cancelled")?;

    let credentials_path = if enable_push {
        let path: String = Input::new()
            .with_prompt("Path to service account key")
            .default("firebase-key.json".to_string())
            .interact_text()
            .context("credentials path input cancelled")?;
        if !Path::new(&path).exists() {
            println!("  Note: {path} does not exist yet; notifications stay disabled until it does.");
        }
        Some(PathBuf::from(path))
    } else {
        None
    };

    let config = AppConfig {
        gateway: GatewayConfig { host, port },
        database: DatabaseConfig {
            path: PathBuf::from(db_path),
        },
        notifications: NotificationsConfig {
            credentials_path,
            project_id: None,
        },
        ..Default::default()
    };

    std::fs::create_dir_all(config_dir)
        .context(format!("failed to create {}", config_dir.display()))?;
    let config_path = config_dir.join("config.yml");
    let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
    std::fs::write(&config_path, &yaml)
        .context(format!("failed to write {}", config_path.display()))?;

    info!("config written to {}", config_path.display());
    println!();
    println!("  Config written to {}", config_path.display());
    println!("  Run `ranchwatch start` to launch the gateway.");
    println!();

    Ok(())
}
