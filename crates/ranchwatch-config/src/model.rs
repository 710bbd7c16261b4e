use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DB_FILE: &str = "fire_alerts.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub notifications: NotificationsConfig,
    /// Directory holding the database when `database.path` is relative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8088,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE),
        }
    }
}

/// Push notification settings. Leaving `credentials_path` unset keeps
/// notifications disabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl AppConfig {
    /// Resolve the database file location against `data_dir`.
    pub fn database_path(&self) -> PathBuf {
        if self.database.path.is_absolute() {
            return self.database.path.clone();
        }
        match &self.data_dir {
            Some(dir) => dir.join(&self.database.path),
            None => self.database.path.clone(),
        }
    }
}
