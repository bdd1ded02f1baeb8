use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use super::{decode_body, run_cached};
use crate::api::auth::Scope;
use crate::api::AppState;
use crate::cache::ResponseCache;
use crate::errors::CostIntelError;
use crate::models::{ComparisonRequest, SimulationComparisonResponse, SimulationRequest, SimulationResponse};
use crate::services::SimulationService;

pub async fn run(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SimulationResponse>, CostIntelError> {
    state.auth.require_scope(&headers, Scope::SimulationsWrite)?;
    let request: SimulationRequest = decode_body(&body)?;
    request.validate()?;

    let key = ResponseCache::build_key("simulations:run", &request);
    run_cached(&state, key, move |db| SimulationService::new(db).run(&request)).await
}

pub async fn compare(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SimulationComparisonResponse>, CostIntelError> {
    state.auth.require_scope(&headers, Scope::SimulationsWrite)?;
    let request: ComparisonRequest = decode_body(&body)?;
    request.validate()?;

    let key = ResponseCache::build_key("simulations:compare", &request);
    run_cached(&state, key, move |db| SimulationService::new(db).compare(&request)).await
}
