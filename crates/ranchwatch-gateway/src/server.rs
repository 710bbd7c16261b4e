use ranchwatch_common::{Error, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::SharedState;

/// Binds to the configured address and serves the API.
///
/// Takes already-initialized state, so the schema has been reconciled before
/// the first connection can be accepted.
pub struct GatewayServer {
    state: SharedState,
}

impl GatewayServer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub async fn run(self) -> Result<()> {
        let gateway = &self.state.config.gateway;
        let addr = format!("{}:{}", gateway.host, gateway.port);

        let listener = TcpListener::bind(&addr).await?;
        info!("RanchWatch gateway listening on {}", addr);

        self.serve(listener).await
    }

    /// Serve on an already-bound listener until the process stops.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = build_router(self.state);
        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Gateway(format!("server error: {e}")))?;

        Ok(())
    }
}
