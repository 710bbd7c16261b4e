use std::path::{Path, PathBuf};

use ranchwatch_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

const CONFIG_FILE_NAMES: [&str; 3] = ["config.yml", "config.yaml", "config.toml"];

/// Locates and parses the config file, then layers environment overrides.
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Loader rooted at `~/.ranchwatch`.
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ranchwatch");
        Self { config_dir }
    }

    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// First existing config file in the config dir, if any.
    pub fn config_path(&self) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| self.config_dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load the config file (defaults when none exists) and apply the
    /// process environment on top.
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = self.load_file()?;
        EnvOverrides::from_env().apply(&mut config)?;
        Ok(config)
    }

    pub fn load_file(&self) -> Result<AppConfig> {
        match self.config_path() {
            Some(path) => {
                let config = parse_config_file(&path)?;
                info!("loaded config from {}", path.display());
                Ok(config)
            }
            None => {
                debug!(
                    "no config file in {}, using defaults",
                    self.config_dir.display()
                );
                Ok(AppConfig::default())
            }
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_config_file(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yml" | "yaml" => serde_yaml::from_str(&contents)
            .map_err(|e| Error::Config(format!("YAML parse error in {}: {e}", path.display()))),
        "toml" => toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("TOML parse error in {}: {e}", path.display()))),
        other => Err(Error::Config(format!(
            "unsupported config extension: {other}"
        ))),
    }
}

/// Environment variables that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub host: Option<String>,
    pub port: Option<String>,
    pub database_path: Option<String>,
    pub credentials_path: Option<String>,
    pub project_id: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            host: var("HOST"),
            port: var("PORT"),
            database_path: var("DATABASE_PATH"),
            credentials_path: var("FIREBASE_KEY_PATH"),
            project_id: var("FIREBASE_PROJECT_ID"),
        }
    }

    pub fn apply(self, config: &mut AppConfig) -> Result<()> {
        if let Some(host) = self.host {
            config.gateway.host = host;
        }
        if let Some(port) = self.port {
            config.gateway.port = port
                .parse()
                .map_err(|e| Error::Config(format!("invalid PORT `{port}`: {e}")))?;
        }
        if let Some(path) = self.database_path {
            config.database.path = PathBuf::from(path);
        }
        if let Some(path) = self.credentials_path {
            config.notifications.credentials_path = Some(PathBuf::from(path));
        }
        if let Some(project_id) = self.project_id {
            config.notifications.project_id = Some(project_id);
        }
        Ok(())
    }
}
