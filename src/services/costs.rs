use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use super::provider::CostDataProvider;
use crate::errors::CostIntelError;
use crate::models::{CostAggregateItem, CostAggregateResponse, CostFilters, CostOverviewResponse, Dimension, DimensionItem, DimensionKind};

/// Inclusive count of calendar months touched by the range, minimum 1.
pub fn months_spanned(start: NaiveDate, end: NaiveDate) -> u32 {
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32 + 1;
    months.max(1) as u32
}

/// Grouped reports and overview summaries.
pub struct CostService<'a> {
    provider: &'a dyn CostDataProvider,
}

impl<'a> CostService<'a> {
    pub fn new(provider: &'a dyn CostDataProvider) -> Self {
        Self { provider }
    }

    pub fn aggregate(
        &self,
        filters: &CostFilters,
        group_by: &[Dimension],
    ) -> Result<CostAggregateResponse, CostIntelError> {
        let items = self.grouped(filters, group_by)?;
        let total_amount = self.provider.total(filters)?;
        debug!(rows = items.len(), group_by = ?group_by, "Aggregated costs");

        Ok(CostAggregateResponse {
            group_by: group_by.to_vec(),
            total_amount: total_amount.round_dp(2),
            items,
        })
    }

    pub fn overview(&self, filters: &CostFilters) -> Result<CostOverviewResponse, CostIntelError> {
        let trend = self.grouped(filters, &[Dimension::Month])?;
        let by_cost_center = self.grouped(filters, &[Dimension::CostCenter])?;
        let by_category = self.grouped(filters, &[Dimension::Category])?;
        let total_cost = self.provider.total(filters)?.round_dp(2);
        let months = Decimal::from(months_spanned(filters.start_date, filters.end_date));

        Ok(CostOverviewResponse {
            total_cost,
            monthly_average: (total_cost / months).round_dp(2),
            period_start: filters.start_date,
            period_end: filters.end_date,
            trend,
            by_cost_center,
            by_category,
        })
    }

    fn grouped(&self, filters: &CostFilters, dimensions: &[Dimension]) -> Result<Vec<CostAggregateItem>, CostIntelError> {
        let mut items = self.provider.grouped_totals(filters, dimensions)?;
        for item in &mut items {
            item.total_amount = item.total_amount.round_dp(2);
        }
        Ok(items)
    }

    pub fn dimensions(&self, kind: DimensionKind) -> Result<Vec<DimensionItem>, CostIntelError> {
        self.provider.list_dimension(kind)
    }
}
