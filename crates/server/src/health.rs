use api_types::health::Health;
use axum::{Json, extract::State};

use crate::server::ServerState;

/// Liveness plus store reachability. Never requires a credential.
pub async fn get(State(state): State<ServerState>) -> Json<Health> {
    let database = if !state.engine.is_configured() {
        "not configured"
    } else if let Err(err) = state.engine.ping().await {
        tracing::warn!("health check ping failed: {err}");
        "unavailable"
    } else {
        "connected"
    };

    Json(Health {
        status: "ok".to_string(),
        database: database.to_string(),
    })
}
