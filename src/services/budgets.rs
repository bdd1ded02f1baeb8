use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::provider::CostDataProvider;
use super::stats::percent_of;
use crate::errors::CostIntelError;
use crate::models::{BudgetVarianceItem, BudgetVarianceResponse, VarianceStatus};

#[derive(Debug, Clone)]
pub struct VarianceQuery {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub cost_center_ids: Vec<i64>,
    pub tolerance_percent: Decimal,
    pub include_on_track: bool,
    pub top_n: Option<usize>,
}

/// Variance percent with the defined fallbacks for a zero plan.
pub fn variance_percent(planned: Decimal, actual: Decimal) -> Decimal {
    if planned > Decimal::ZERO {
        percent_of(actual - planned, planned, Decimal::ZERO).round_dp(2)
    } else if actual > Decimal::ZERO {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

pub fn classify_variance(
    planned: Decimal,
    actual: Decimal,
    variance_percent: Decimal,
    tolerance: Decimal,
) -> VarianceStatus {
    if planned <= Decimal::ZERO && actual > Decimal::ZERO {
        VarianceStatus::OverBudget
    } else if variance_percent.abs() <= tolerance {
        VarianceStatus::OnTrack
    } else if variance_percent > tolerance {
        VarianceStatus::OverBudget
    } else {
        VarianceStatus::UnderBudget
    }
}

pub struct BudgetService<'a> {
    provider: &'a dyn CostDataProvider,
}

impl<'a> BudgetService<'a> {
    pub fn new(provider: &'a dyn CostDataProvider) -> Self {
        Self { provider }
    }

    pub fn variance_by_center(&self, query: &VarianceQuery) -> Result<BudgetVarianceResponse, CostIntelError> {
        let rows = self
            .provider
            .budget_vs_actual(query.period_start, query.period_end, &query.cost_center_ids)?;

        let mut items: Vec<BudgetVarianceItem> = rows
            .into_iter()
            .map(|row| {
                let planned = row.planned_amount.round_dp(2);
                let actual = row.actual_amount.round_dp(2);
                let pct = variance_percent(planned, actual);
                BudgetVarianceItem {
                    cost_center_id: row.cost_center_id,
                    cost_center: row.cost_center,
                    planned_amount: planned,
                    actual_amount: actual,
                    variance_amount: actual - planned,
                    variance_percent: pct,
                    status: classify_variance(planned, actual, pct, query.tolerance_percent),
                }
            })
            .filter(|item| query.include_on_track || item.status != VarianceStatus::OnTrack)
            .collect();

        items.sort_by(|a, b| b.variance_amount.abs().cmp(&a.variance_amount.abs()));
        if let Some(n) = query.top_n {
            items.truncate(n);
        }

        let total_planned: Decimal = items.iter().map(|i| i.planned_amount).sum();
        let total_actual: Decimal = items.iter().map(|i| i.actual_amount).sum();
        debug!(items = items.len(), tolerance = %query.tolerance_percent, "Computed budget variance");

        Ok(BudgetVarianceResponse {
            period_start: query.period_start,
            period_end: query.period_end,
            tolerance_percent: query.tolerance_percent,
            total_planned,
            total_actual,
            total_variance: total_actual - total_planned,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::provider::BudgetActualRow;
    use crate::services::testing::FakeProvider;
    use rust_decimal_macros::dec;

    fn row(id: i64, name: &str, planned: Decimal, actual: Decimal) -> BudgetActualRow {
        BudgetActualRow {
            cost_center_id: id,
            cost_center: name.to_string(),
            planned_amount: planned,
            actual_amount: actual,
        }
    }

    fn provider() -> FakeProvider {
        FakeProvider {
            budget: vec![
                row(1, "Operacoes", dec!(100000), dec!(112500)),
                row(2, "TI", dec!(80000), dec!(79200)),
                row(3, "RH", dec!(45000), dec!(38000)),
            ],
            ..Default::default()
        }
    }

    fn query(include_on_track: bool, top_n: Option<usize>) -> VarianceQuery {
        VarianceQuery {
            period_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            cost_center_ids: vec![],
            tolerance_percent: dec!(2),
            include_on_track,
            top_n,
        }
    }

    #[test]
    fn test_over_budget_example() {
        let provider = provider();
        let result = BudgetService::new(&provider).variance_by_center(&query(true, None)).unwrap();

        let first = &result.items[0];
        assert_eq!(first.cost_center, "Operacoes");
        assert_eq!(first.variance_amount, dec!(12500));
        assert_eq!(first.variance_percent, dec!(12.5));
        assert_eq!(first.status, VarianceStatus::OverBudget);
        assert!(result.items.iter().any(|i| i.status == VarianceStatus::UnderBudget));
        assert!(result.total_variance > Decimal::ZERO);
    }

    #[test]
    fn test_sorted_by_absolute_variance() {
        let provider = provider();
        let result = BudgetService::new(&provider).variance_by_center(&query(true, None)).unwrap();
        let names: Vec<&str> = result.items.iter().map(|i| i.cost_center.as_str()).collect();
        assert_eq!(names, vec!["Operacoes", "RH", "TI"]);
    }

    #[test]
    fn test_exclude_on_track_and_totals_follow_items() {
        let provider = provider();
        let result = BudgetService::new(&provider).variance_by_center(&query(false, None)).unwrap();

        assert_eq!(result.items.len(), 2);
        assert!(result.items.iter().all(|i| i.status != VarianceStatus::OnTrack));
        assert_eq!(result.total_planned, dec!(145000));
        assert_eq!(result.total_actual, dec!(150500));
        assert_eq!(result.total_variance, dec!(5500));
    }

    #[test]
    fn test_top_n_truncates_before_totals() {
        let provider = provider();
        let result = BudgetService::new(&provider).variance_by_center(&query(true, Some(1))).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.total_planned, dec!(100000));
        assert_eq!(result.total_actual, dec!(112500));
    }

    #[test]
    fn test_cent_amounts_sum_exactly() {
        let provider = FakeProvider {
            budget: vec![
                row(1, "A", dec!(0.10), dec!(0.20)),
                row(2, "B", dec!(0.20), dec!(0.10)),
            ],
            ..Default::default()
        };
        let result = BudgetService::new(&provider).variance_by_center(&query(true, None)).unwrap();
        assert_eq!(result.total_planned, dec!(0.30));
        assert_eq!(result.total_actual, dec!(0.30));
        assert_eq!(result.total_variance, Decimal::ZERO);
        assert_eq!(result.items[0].variance_percent, dec!(100));
        assert_eq!(result.items[1].variance_percent, dec!(-50));
    }

    #[test]
    fn test_variance_percent_rounds_to_cents() {
        // 1/3 over plan
        assert_eq!(variance_percent(dec!(300), dec!(301)), dec!(0.33));
        assert_eq!(variance_percent(dec!(300), dec!(302)), dec!(0.67));
    }

    #[test]
    fn test_zero_plan_fallbacks() {
        assert_eq!(variance_percent(Decimal::ZERO, dec!(500)), dec!(100));
        assert_eq!(variance_percent(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(
            classify_variance(Decimal::ZERO, dec!(500), dec!(100), dec!(150)),
            VarianceStatus::OverBudget
        );
        assert_eq!(
            classify_variance(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, dec!(3)),
            VarianceStatus::OnTrack
        );
    }

    #[test]
    fn test_status_is_a_partition() {
        for pct in [dec!(-50), dec!(-3), dec!(-2), dec!(0), dec!(2), dec!(2.01), dec!(40)] {
            let planned = dec!(1000);
            let actual = planned * (Decimal::ONE + pct / Decimal::ONE_HUNDRED);
            let status = classify_variance(planned, actual, variance_percent(planned, actual), dec!(2));
            let expected = if pct > dec!(2) {
                VarianceStatus::OverBudget
            } else if pct < dec!(-2) {
                VarianceStatus::UnderBudget
            } else {
                VarianceStatus::OnTrack
            };
            assert_eq!(status, expected, "pct={}", pct);
        }
    }
}
