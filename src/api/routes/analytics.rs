use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use super::run_cached;
use crate::api::auth::Scope;
use crate::api::params::{lookback_period, today, QueryParams};
use crate::api::AppState;
use crate::cache::ResponseCache;
use crate::errors::CostIntelError;
use crate::models::{AnomalyDetectionResponse, QuickWinsResponse, WasteRankingResponse};
use crate::services::{AnalyticsService, AnomalyQuery, QuickWinQuery};

/// `end_date` (default today) and the lookback window it closes.
fn period(params: &QueryParams, default_months: i64, min: i64, max: i64) -> Result<(NaiveDate, NaiveDate), CostIntelError> {
    let end = params.date("end_date")?.unwrap_or_else(today);
    let months = params.int_in("lookback_months", default_months, min, max)?;
    lookback_period(end, months as u32)
}

pub async fn waste_ranking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<WasteRankingResponse>, CostIntelError> {
    state.auth.require_scope(&headers, Scope::AnalyticsRead)?;
    let params = QueryParams::new(pairs);
    let (start, end) = period(&params, 3, 1, 12)?;
    let top_n = params.int_in("top_n", 10, 1, 50)? as usize;
    let comparison_days = params.optional_int_in("comparison_days", 1, 366)?.map(|d| d as u32);

    let key = ResponseCache::build_key(
        "analytics:waste",
        &json!({
            "period_start": start,
            "period_end": end,
            "comparison_days": comparison_days,
            "top_n": top_n,
        }),
    );
    run_cached(&state, key, move |db| {
        AnalyticsService::new(db).waste_ranking(start, end, comparison_days, top_n)
    })
    .await
}

pub async fn detect_anomalies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<AnomalyDetectionResponse>, CostIntelError> {
    state.auth.require_scope(&headers, Scope::AnalyticsRead)?;
    let params = QueryParams::new(pairs);
    let (period_start, period_end) = period(&params, 12, 3, 36)?;
    let query = AnomalyQuery {
        period_start,
        period_end,
        threshold_z: params.float_in("threshold_z", 2.0, 1.0, 6.0)?,
        history_window: params.int_in("history_window", 4, 2, 12)? as usize,
        top_n: params.int_in("top_n", 20, 1, 100)? as usize,
    };

    let key = ResponseCache::build_key(
        "analytics:anomalies",
        &json!({
            "period_start": query.period_start,
            "period_end": query.period_end,
            "threshold_z": query.threshold_z,
            "history_window": query.history_window,
            "top_n": query.top_n,
        }),
    );
    run_cached(&state, key, move |db| AnalyticsService::new(db).detect_anomalies(&query)).await
}

pub async fn quick_wins(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<QuickWinsResponse>, CostIntelError> {
    state.auth.require_scope(&headers, Scope::AnalyticsRead)?;
    let params = QueryParams::new(pairs);
    let (period_start, period_end) = period(&params, 6, 2, 24)?;
    let query = QuickWinQuery {
        period_start,
        period_end,
        target_reduction_percent: params.decimal_in(
            "target_reduction_percent",
            Decimal::new(8, 0),
            Decimal::ONE,
            Some(Decimal::new(30, 0)),
        )?,
        minimum_total: params.decimal_in("minimum_total", Decimal::new(10_000, 0), Decimal::new(1000, 0), None)?,
        top_n: params.int_in("top_n", 10, 1, 50)? as usize,
    };

    let key = ResponseCache::build_key(
        "analytics:quick_wins",
        &json!({
            "period_start": query.period_start,
            "period_end": query.period_end,
            "target_reduction_percent": query.target_reduction_percent,
            "minimum_total": query.minimum_total,
            "top_n": query.top_n,
        }),
    );
    run_cached(&state, key, move |db| AnalyticsService::new(db).quick_wins(&query)).await
}
