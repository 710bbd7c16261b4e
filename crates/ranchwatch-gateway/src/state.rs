use std::sync::Arc;

use chrono::{DateTime, Utc};
use ranchwatch_common::Result;
use ranchwatch_config::AppConfig;
use ranchwatch_db::Store;
use tracing::info;

use crate::notifications::NotificationState;

/// Shared application state accessible from all request handlers.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<Store>,
    pub notifications: NotificationState,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<Store>, notifications: NotificationState) -> Self {
        Self {
            config,
            store,
            notifications,
            started_at: Utc::now(),
        }
    }

    /// Open the database (reconciling its schema) and resolve the notification
    /// state. Must finish before the listener is bound.
    pub fn initialize(config: AppConfig) -> Result<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Store::open(&db_path)?;
        info!("database ready at {}", db_path.display());

        let notifications = NotificationState::resolve(&config.notifications);
        Ok(Self::new(config, Arc::new(store), notifications))
    }
}

pub type SharedState = Arc<AppState>;
