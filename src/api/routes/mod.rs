pub mod analytics;
pub mod budgets;
pub mod costs;
pub mod health;
pub mod simulations;

use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::AppState;
use crate::db::Database;
use crate::errors::CostIntelError;

/// Run a synchronous report computation on the blocking pool, memoized under
/// `key` when the cache is enabled.
pub(crate) async fn run_cached<T, F>(
    state: &AppState,
    key: Option<String>,
    compute: F,
) -> Result<Json<T>, CostIntelError>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce(&Database) -> Result<T, CostIntelError> + Send + 'static,
{
    let db = state.db.clone();
    let cache = state.cache.clone();
    tokio::task::spawn_blocking(move || cache.get_or_compute(key.as_deref(), || compute(&db)))
        .await
        .map_err(|e| CostIntelError::Internal(format!("Report task failed: {}", e)))?
        .map(Json)
}

/// Decode a JSON request body. Syntax errors are a bad request; well-formed
/// bodies with the wrong shape are a validation error.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, CostIntelError> {
    serde_json::from_slice(body).map_err(|e| {
        if e.is_data() {
            CostIntelError::validation(format!("Invalid request body: {}", e))
        } else {
            CostIntelError::BadRequest(format!("Malformed JSON body: {}", e))
        }
    })
}
