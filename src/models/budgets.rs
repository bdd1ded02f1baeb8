use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classification of actual vs planned spend relative to a tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    OverBudget,
    OnTrack,
    UnderBudget,
}

impl VarianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OverBudget => "over_budget",
            Self::OnTrack => "on_track",
            Self::UnderBudget => "under_budget",
        }
    }
}

impl std::fmt::Display for VarianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetVarianceItem {
    pub cost_center_id: i64,
    pub cost_center: String,
    pub planned_amount: Decimal,
    pub actual_amount: Decimal,
    pub variance_amount: Decimal,
    pub variance_percent: Decimal,
    pub status: VarianceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetVarianceResponse {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub tolerance_percent: Decimal,
    /// Totals cover only the returned items.
    pub total_planned: Decimal,
    pub total_actual: Decimal,
    pub total_variance: Decimal,
    pub items: Vec<BudgetVarianceItem>,
}
