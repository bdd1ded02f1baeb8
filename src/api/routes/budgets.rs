use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;

use super::run_cached;
use crate::api::auth::Scope;
use crate::api::params::QueryParams;
use crate::api::AppState;
use crate::cache::ResponseCache;
use crate::errors::CostIntelError;
use crate::models::{BudgetVarianceResponse, CostFilters};
use crate::services::{BudgetService, VarianceQuery};

pub async fn variance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<BudgetVarianceResponse>, CostIntelError> {
    state.auth.require_scope(&headers, Scope::BudgetsRead)?;
    let params = QueryParams::new(pairs);

    let filters = CostFilters::new(
        params.required_date("start_date")?,
        params.required_date("end_date")?,
        params.ids("cost_center_ids")?,
        Vec::new(),
        Vec::new(),
    )?;
    let query = VarianceQuery {
        period_start: filters.start_date,
        period_end: filters.end_date,
        cost_center_ids: filters.cost_center_ids,
        tolerance_percent: params.decimal_in("tolerance_percent", Decimal::new(3, 0), Decimal::ZERO, Some(Decimal::new(30, 0)))?,
        include_on_track: params.bool_or("include_on_track", true)?,
        top_n: params.optional_int_in("top_n", 1, 100)?.map(|n| n as usize),
    };

    let key = ResponseCache::build_key(
        "budgets:variance",
        &json!({
            "start_date": query.period_start,
            "end_date": query.period_end,
            "cost_center_ids": &query.cost_center_ids,
            "tolerance_percent": query.tolerance_percent,
            "include_on_track": query.include_on_track,
            "top_n": query.top_n,
        }),
    );
    run_cached(&state, key, move |db| BudgetService::new(db).variance_by_center(&query)).await
}
