use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use chrono::Utc;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let database_connected = match state.store.ping() {
        Ok(()) => true,
        Err(e) => {
            warn!("status check could not reach database: {e}");
            false
        }
    };

    Json(json!({
        "status": "running",
        "database_connected": database_connected,
        "notifications": {
            "enabled": state.notifications.is_enabled(),
            "reason": state.notifications.disabled_reason(),
        },
        "schema": state.store.schema_reports(),
        "started_at": state.started_at.to_rfc3339(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Not found" })),
    )
}
