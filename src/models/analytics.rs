use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteRankingItem {
    pub cost_center: String,
    pub category: String,
    pub previous_period_total: Decimal,
    pub current_period_total: Decimal,
    pub estimated_waste: Decimal,
    pub variation_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteRankingResponse {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub comparison_start: NaiveDate,
    pub comparison_end: NaiveDate,
    pub items: Vec<WasteRankingItem>,
}

/// A monthly spike flagged against its trailing baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyItem {
    pub month: NaiveDate,
    pub cost_center: String,
    pub category: String,
    pub amount: Decimal,
    pub baseline_mean: Decimal,
    pub baseline_std: Decimal,
    pub z_score: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyDetectionResponse {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub threshold_z: f64,
    pub history_window: usize,
    pub items: Vec<AnomalyItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickWinOpportunity {
    pub cost_center: String,
    pub category: String,
    pub period_total: Decimal,
    pub monthly_average: Decimal,
    pub trend_percent: Decimal,
    pub volatility: Decimal,
    pub opportunity_score: Decimal,
    pub estimated_savings: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickWinsResponse {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub target_reduction_percent: Decimal,
    pub minimum_total: Decimal,
    pub items: Vec<QuickWinOpportunity>,
}
