//! In-memory provider used by the service unit tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::provider::{BudgetActualRow, BucketTotal, CostDataProvider, MatrixRow, MonthlyBucketTotal};
use crate::errors::CostIntelError;
use crate::models::{CostAggregateItem, CostFilters, Dimension, DimensionItem, DimensionKind};

#[derive(Default)]
pub struct FakeProvider {
    pub total: Decimal,
    pub grouped: Vec<(Dimension, Vec<CostAggregateItem>)>,
    pub matrix: Vec<MatrixRow>,
    /// (inclusive range start, rows) pairs; the latest start <= query start wins.
    pub buckets: Vec<(NaiveDate, Vec<BucketTotal>)>,
    pub monthly: Vec<MonthlyBucketTotal>,
    pub budget: Vec<BudgetActualRow>,
    pub fail: bool,
}

impl FakeProvider {
    fn check(&self) -> Result<(), CostIntelError> {
        if self.fail {
            return Err(CostIntelError::Database("connection refused".into()));
        }
        Ok(())
    }
}

pub fn matrix_row(center_id: i64, center: &str, category_id: i64, category: &str, amount: Decimal) -> MatrixRow {
    MatrixRow {
        cost_center_id: center_id,
        cost_center_name: center.to_string(),
        category_id,
        category_name: category.to_string(),
        total_amount: amount,
    }
}

pub fn monthly(y: i32, m: u32, center: &str, category: &str, amount: Decimal) -> MonthlyBucketTotal {
    MonthlyBucketTotal {
        month: NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
        cost_center: center.to_string(),
        category: category.to_string(),
        total_amount: amount,
    }
}

impl CostDataProvider for FakeProvider {
    fn total(&self, _filters: &CostFilters) -> Result<Decimal, CostIntelError> {
        self.check()?;
        Ok(self.total)
    }

    fn grouped_totals(
        &self,
        _filters: &CostFilters,
        dimensions: &[Dimension],
    ) -> Result<Vec<CostAggregateItem>, CostIntelError> {
        self.check()?;
        Ok(self
            .grouped
            .iter()
            .find(|(dim, _)| dimensions.first() == Some(dim))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    fn simulation_matrix(&self, _filters: &CostFilters) -> Result<Vec<MatrixRow>, CostIntelError> {
        self.check()?;
        Ok(self.matrix.clone())
    }

    fn bucket_totals(&self, start: NaiveDate, _end: NaiveDate) -> Result<Vec<BucketTotal>, CostIntelError> {
        self.check()?;
        Ok(self
            .buckets
            .iter()
            .filter(|(from, _)| *from <= start)
            .max_by_key(|(from, _)| *from)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    fn monthly_bucket_totals(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<MonthlyBucketTotal>, CostIntelError> {
        self.check()?;
        Ok(self.monthly.clone())
    }

    fn budget_vs_actual(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
        cost_center_ids: &[i64],
    ) -> Result<Vec<BudgetActualRow>, CostIntelError> {
        self.check()?;
        Ok(self
            .budget
            .iter()
            .filter(|row| cost_center_ids.is_empty() || cost_center_ids.contains(&row.cost_center_id))
            .cloned()
            .collect())
    }

    fn list_dimension(&self, _kind: DimensionKind) -> Result<Vec<DimensionItem>, CostIntelError> {
        self.check()?;
        Ok(Vec::new())
    }
}
