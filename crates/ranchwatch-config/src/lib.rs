pub mod loader;
pub mod model;

pub use loader::{ConfigLoader, EnvOverrides};
pub use model::{AppConfig, DatabaseConfig, GatewayConfig, NotificationsConfig};
