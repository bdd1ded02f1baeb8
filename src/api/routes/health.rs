use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::api::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db = state.db.clone();
    let database = match tokio::task::spawn_blocking(move || db.ping()).await {
        Ok(Ok(())) => "ok",
        Ok(Err(e)) => {
            warn!(error = %e, "Health check could not reach the database");
            "unavailable"
        }
        Err(e) => {
            warn!(error = %e, "Health check task failed");
            "unavailable"
        }
    };

    Json(json!({
        "status": "ok",
        "service": "costintel",
        "version": env!("CARGO_PKG_VERSION"),
        "build": {
            "timestamp": env!("BUILD_TIMESTAMP"),
            "git_hash": option_env!("GIT_HASH").unwrap_or("unknown"),
        },
        "database": database,
    }))
}
