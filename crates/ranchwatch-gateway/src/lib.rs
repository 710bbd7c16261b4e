pub mod notifications;
pub mod router;
pub mod server;
pub mod state;

pub use notifications::NotificationState;
pub use server::GatewayServer;
pub use state::{AppState, SharedState};
