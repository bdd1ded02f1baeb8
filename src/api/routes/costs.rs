use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde_json::json;

use super::run_cached;
use crate::api::auth::Scope;
use crate::api::params::QueryParams;
use crate::api::AppState;
use crate::cache::ResponseCache;
use crate::errors::CostIntelError;
use crate::models::{
    CostAggregateResponse, CostFilters, CostOverviewResponse, Dimension, DimensionItem, DimensionKind,
};
use crate::services::CostService;

/// Date range plus the three id filters, normalized.
pub(crate) fn cost_filters(params: &QueryParams) -> Result<CostFilters, CostIntelError> {
    CostFilters::new(
        params.required_date("start_date")?,
        params.required_date("end_date")?,
        params.ids("cost_center_ids")?,
        params.ids("project_ids")?,
        params.ids("category_ids")?,
    )
}

pub async fn aggregate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<CostAggregateResponse>, CostIntelError> {
    state.auth.require_scope(&headers, Scope::CostsRead)?;
    let params = QueryParams::new(pairs);
    let filters = cost_filters(&params)?;

    let requested = params.list("group_by");
    let group_by = if requested.is_empty() {
        vec![Dimension::Month]
    } else {
        Dimension::parse_list(&requested)?
    };

    let key = ResponseCache::build_key(
        "costs:aggregate",
        &json!({ "filters": &filters, "group_by": &group_by }),
    );
    run_cached(&state, key, move |db| CostService::new(db).aggregate(&filters, &group_by)).await
}

pub async fn overview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<CostOverviewResponse>, CostIntelError> {
    state.auth.require_scope(&headers, Scope::CostsRead)?;
    let filters = cost_filters(&QueryParams::new(pairs))?;

    let key = ResponseCache::build_key("costs:overview", &filters);
    run_cached(&state, key, move |db| CostService::new(db).overview(&filters)).await
}

async fn list_dimension(
    state: AppState,
    headers: HeaderMap,
    kind: DimensionKind,
) -> Result<Json<Vec<DimensionItem>>, CostIntelError> {
    state.auth.require_scope(&headers, Scope::CostsRead)?;
    run_cached(&state, None, move |db| CostService::new(db).dimensions(kind)).await
}

pub async fn list_cost_centers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<DimensionItem>>, CostIntelError> {
    list_dimension(state, headers, DimensionKind::CostCenters).await
}

pub async fn list_projects(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<DimensionItem>>, CostIntelError> {
    list_dimension(state, headers, DimensionKind::Projects).await
}

pub async fn list_categories(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<DimensionItem>>, CostIntelError> {
    list_dimension(state, headers, DimensionKind::Categories).await
}
