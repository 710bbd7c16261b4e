use std::path::{Path, PathBuf};

use ranchwatch_config::NotificationsConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Whether push notifications can be sent, decided once at startup.
///
/// A missing or unusable credential file only disables notifications; the
/// deployment directory is never written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NotificationState {
    Enabled {
        credentials_path: PathBuf,
        project_id: String,
    },
    Disabled {
        reason: String,
    },
}

/// The fields of a service account key we rely on.
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    #[serde(rename = "type")]
    kind: String,
    project_id: String,
    client_email: String,
}

impl NotificationState {
    pub fn resolve(config: &NotificationsConfig) -> Self {
        let state = match &config.credentials_path {
            None => Self::disabled("no credentials configured"),
            Some(path) => Self::from_credentials(path, config.project_id.as_deref()),
        };
        match &state {
            Self::Enabled {
                credentials_path,
                project_id,
            } => info!(
                "push notifications enabled (project {project_id}, key {})",
                credentials_path.display()
            ),
            Self::Disabled { reason } => warn!("push notifications disabled: {reason}"),
        }
        state
    }

    fn from_credentials(path: &Path, project_override: Option<&str>) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                return Self::disabled(format!(
                    "cannot read credentials {}: {e}",
                    path.display()
                ));
            }
        };
        let key: ServiceAccountKey = match serde_json::from_str(&contents) {
            Ok(key) => key,
            Err(e) => {
                return Self::disabled(format!(
                    "malformed credentials {}: {e}",
                    path.display()
                ));
            }
        };
        if key.kind != "service_account" {
            return Self::disabled(format!(
                "credentials {} are `{}`, expected `service_account`",
                path.display(),
                key.kind
            ));
        }
        if key.client_email.is_empty() {
            return Self::disabled(format!("credentials {} lack client_email", path.display()));
        }

        Self::Enabled {
            credentials_path: path.to_path_buf(),
            project_id: project_override.unwrap_or(&key.project_id).to_string(),
        }
    }

    fn disabled(reason: impl Into<String>) -> Self {
        Self::Disabled {
            reason: reason.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }

    pub fn disabled_reason(&self) -> Option<&str> {
        match self {
            Self::Enabled { .. } => None,
            Self::Disabled { reason } => Some(reason),
        }
    }
}
