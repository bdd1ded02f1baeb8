use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use super::filters::Dimension;

/// One row of a grouped cost report. Only the grouped dimensions are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostAggregateItem {
    pub month: Option<NaiveDate>,
    pub cost_center: Option<String>,
    pub project: Option<String>,
    pub category: Option<String>,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAggregateResponse {
    pub group_by: Vec<Dimension>,
    pub total_amount: Decimal,
    pub items: Vec<CostAggregateItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostOverviewResponse {
    pub total_cost: Decimal,
    pub monthly_average: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub trend: Vec<CostAggregateItem>,
    pub by_cost_center: Vec<CostAggregateItem>,
    pub by_category: Vec<CostAggregateItem>,
}

/// Reference entry (cost center, project or category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionItem {
    pub id: i64,
    pub code: String,
    pub name: String,
}
