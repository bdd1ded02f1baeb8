use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::CostIntelError;
use crate::models::{CostAggregateItem, CostFilters, Dimension, DimensionItem, DimensionKind};

/// One (cost center, category) cell of the simulation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub cost_center_id: i64,
    pub cost_center_name: String,
    pub category_id: i64,
    pub category_name: String,
    pub total_amount: Decimal,
}

/// Name-keyed bucket total for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketTotal {
    pub cost_center: String,
    pub category: String,
    pub total_amount: Decimal,
}

/// Name-keyed bucket total for one month. `month` is the first of the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucketTotal {
    pub month: NaiveDate,
    pub cost_center: String,
    pub category: String,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetActualRow {
    pub cost_center_id: i64,
    pub cost_center: String,
    pub planned_amount: Decimal,
    pub actual_amount: Decimal,
}

/// Aggregate queries the reporting services read from.
///
/// Amounts are exact to the cent; implementations backed by floating point
/// storage convert at this boundary.
///
/// Every call is a point-in-time snapshot. Errors are returned unchanged to
/// the caller; implementations must not retry.
pub trait CostDataProvider {
    fn total(&self, filters: &CostFilters) -> Result<Decimal, CostIntelError>;

    fn grouped_totals(
        &self,
        filters: &CostFilters,
        dimensions: &[Dimension],
    ) -> Result<Vec<CostAggregateItem>, CostIntelError>;

    fn simulation_matrix(&self, filters: &CostFilters) -> Result<Vec<MatrixRow>, CostIntelError>;

    fn bucket_totals(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BucketTotal>, CostIntelError>;

    fn monthly_bucket_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MonthlyBucketTotal>, CostIntelError>;

    fn budget_vs_actual(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        cost_center_ids: &[i64],
    ) -> Result<Vec<BudgetActualRow>, CostIntelError>;

    fn list_dimension(&self, kind: DimensionKind) -> Result<Vec<DimensionItem>, CostIntelError>;
}
