//! Budget-cut simulation over the cost-center x category matrix.
//!
//! Cuts are applied as a pipeline of pure stages, each producing a new set of
//! buckets:
//!
//! 1. percentage cuts, composed multiplicatively per bucket
//! 2. cost-center absolute cuts
//! 3. category absolute cuts
//!
//! Stage 2 always runs before stage 3. When a center absolute cut and a
//! category absolute cut overlap on the same buckets the order changes the
//! result; this ordering is part of the contract.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tracing::debug;

use super::provider::{CostDataProvider, MatrixRow};
use super::stats::percent_of;
use crate::errors::CostIntelError;
use crate::models::{
    CategoryCut, CenterCut, ComparisonRequest, CostFilters, Cut, ImpactRankingItem, SimulationComparisonItem,
    SimulationComparisonResponse, SimulationRequest, SimulationResponse,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationBucket {
    pub cost_center_id: i64,
    pub cost_center_name: String,
    pub category_id: i64,
    pub category_name: String,
    pub baseline_amount: Decimal,
    pub projected_amount: Decimal,
}

/// Which side of the matrix a cut targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutAxis {
    CostCenter,
    Category,
}

impl CutAxis {
    fn entity_id(&self, bucket: &SimulationBucket) -> i64 {
        match self {
            Self::CostCenter => bucket.cost_center_id,
            Self::Category => bucket.category_id,
        }
    }

    fn entity_name<'b>(&self, bucket: &'b SimulationBucket) -> &'b str {
        match self {
            Self::CostCenter => &bucket.cost_center_name,
            Self::Category => &bucket.category_name,
        }
    }
}

/// Cuts of one scenario, indexed by entity id.
#[derive(Debug, Clone, Default)]
pub struct CutPlan {
    center_pct: HashMap<i64, Decimal>,
    category_pct: HashMap<i64, Decimal>,
    center_abs: BTreeMap<i64, Decimal>,
    category_abs: BTreeMap<i64, Decimal>,
}

impl CutPlan {
    pub fn new(center_cuts: &[CenterCut], category_cuts: &[CategoryCut]) -> Self {
        Self {
            center_pct: percent_map(center_cuts),
            category_pct: percent_map(category_cuts),
            center_abs: absolute_map(center_cuts),
            category_abs: absolute_map(category_cuts),
        }
    }

    /// Combined reduction fraction for one bucket: 1 - (1 - c)(1 - k).
    pub fn combined_reduction(&self, cost_center_id: i64, category_id: i64) -> Decimal {
        let center = self.center_pct.get(&cost_center_id).copied().unwrap_or_default();
        let category = self.category_pct.get(&category_id).copied().unwrap_or_default();
        Decimal::ONE - (Decimal::ONE - center) * (Decimal::ONE - category)
    }

    /// Run all three stages against a baseline matrix.
    pub fn apply(&self, matrix: &[MatrixRow]) -> Vec<SimulationBucket> {
        let buckets = self.apply_percentage_cuts(matrix);
        let buckets = apply_absolute_cuts(&buckets, &self.center_abs, CutAxis::CostCenter);
        apply_absolute_cuts(&buckets, &self.category_abs, CutAxis::Category)
    }

    pub fn apply_percentage_cuts(&self, matrix: &[MatrixRow]) -> Vec<SimulationBucket> {
        matrix
            .iter()
            .map(|row| {
                let reduction = self.combined_reduction(row.cost_center_id, row.category_id);
                SimulationBucket {
                    cost_center_id: row.cost_center_id,
                    cost_center_name: row.cost_center_name.clone(),
                    category_id: row.category_id,
                    category_name: row.category_name.clone(),
                    baseline_amount: row.total_amount,
                    projected_amount: row.total_amount * (Decimal::ONE - reduction).max(Decimal::ZERO),
                }
            })
            .collect()
    }
}

fn percent_map<C: Cut>(cuts: &[C]) -> HashMap<i64, Decimal> {
    cuts.iter().map(|c| (c.entity_id(), c.percent_cut() / Decimal::ONE_HUNDRED)).collect()
}

fn absolute_map<C: Cut>(cuts: &[C]) -> BTreeMap<i64, Decimal> {
    cuts.iter()
        .filter(|c| c.absolute_cut() > Decimal::ZERO)
        .map(|c| (c.entity_id(), c.absolute_cut()))
        .collect()
}

/// Remove up to `absolute_cut` currency units from each targeted entity,
/// spread proportionally over its buckets. The removal factor is capped at 1
/// so an entity can be zeroed but never go negative.
pub fn apply_absolute_cuts(
    buckets: &[SimulationBucket],
    cuts: &BTreeMap<i64, Decimal>,
    axis: CutAxis,
) -> Vec<SimulationBucket> {
    if cuts.is_empty() {
        return buckets.to_vec();
    }

    let mut current_totals: HashMap<i64, Decimal> = HashMap::new();
    for bucket in buckets {
        let id = axis.entity_id(bucket);
        if cuts.contains_key(&id) {
            *current_totals.entry(id).or_default() += bucket.projected_amount;
        }
    }

    let factors: HashMap<i64, Decimal> = cuts
        .iter()
        .filter_map(|(id, cut)| {
            let total = current_totals.get(id).copied().unwrap_or_default();
            if total <= Decimal::ZERO {
                return None;
            }
            cut.checked_div(total).map(|factor| (*id, factor.min(Decimal::ONE)))
        })
        .collect();

    buckets
        .iter()
        .map(|bucket| match factors.get(&axis.entity_id(bucket)) {
            Some(factor) => SimulationBucket {
                projected_amount: bucket.projected_amount * (Decimal::ONE - factor),
                ..bucket.clone()
            },
            None => bucket.clone(),
        })
        .collect()
}

/// Per-entity baseline/projected sums ordered by estimated savings, ties kept
/// in first-seen order.
pub fn entity_ranking(buckets: &[SimulationBucket], axis: CutAxis) -> Vec<ImpactRankingItem> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut sums: Vec<(i64, String, Decimal, Decimal)> = Vec::new();
    for bucket in buckets {
        let id = axis.entity_id(bucket);
        let slot = *index.entry(id).or_insert_with(|| {
            sums.push((id, axis.entity_name(bucket).to_string(), Decimal::ZERO, Decimal::ZERO));
            sums.len() - 1
        });
        sums[slot].2 += bucket.baseline_amount;
        sums[slot].3 += bucket.projected_amount;
    }

    let mut ranking: Vec<ImpactRankingItem> = sums
        .into_iter()
        .map(|(entity_id, entity_name, baseline, projected)| {
            let baseline = baseline.round_dp(2);
            let projected = projected.round_dp(2);
            let savings = (baseline - projected).max(Decimal::ZERO);
            ImpactRankingItem {
                entity_id,
                entity_name,
                baseline_amount: baseline,
                projected_amount: projected,
                estimated_savings: savings,
                impact_percent: percent_of(savings, baseline, Decimal::ZERO).round_dp(2),
            }
        })
        .collect();

    ranking.sort_by(|a, b| b.estimated_savings.cmp(&a.estimated_savings));
    ranking
}

/// Summarize a projected bucket set.
pub fn summarize(buckets: &[SimulationBucket]) -> SimulationResponse {
    let baseline_total = buckets.iter().map(|b| b.baseline_amount).sum::<Decimal>().round_dp(2);
    let projected_total = buckets.iter().map(|b| b.projected_amount).sum::<Decimal>().round_dp(2);
    let estimated_savings = (baseline_total - projected_total).max(Decimal::ZERO);

    SimulationResponse {
        baseline_total,
        projected_total,
        estimated_savings,
        impact_percent: percent_of(estimated_savings, baseline_total, Decimal::ZERO).round_dp(2),
        center_impact_ranking: entity_ranking(buckets, CutAxis::CostCenter),
        category_impact_ranking: entity_ranking(buckets, CutAxis::Category),
    }
}

pub struct SimulationService<'a> {
    provider: &'a dyn CostDataProvider,
}

impl<'a> SimulationService<'a> {
    pub fn new(provider: &'a dyn CostDataProvider) -> Self {
        Self { provider }
    }

    pub fn run(&self, request: &SimulationRequest) -> Result<SimulationResponse, CostIntelError> {
        let filters = CostFilters::for_period(request.start_date, request.end_date)?;
        let matrix = self.provider.simulation_matrix(&filters)?;
        let buckets = CutPlan::new(&request.center_cuts, &request.category_cuts).apply(&matrix);
        let response = summarize(&buckets);
        debug!(
            buckets = buckets.len(),
            savings = %response.estimated_savings,
            "Simulation complete"
        );
        Ok(response)
    }

    pub fn compare(&self, request: &ComparisonRequest) -> Result<SimulationComparisonResponse, CostIntelError> {
        let filters = CostFilters::for_period(request.start_date, request.end_date)?;
        let matrix = self.provider.simulation_matrix(&filters)?;

        let mut items: Vec<SimulationComparisonItem> = request
            .scenarios
            .iter()
            .map(|scenario| {
                let buckets = CutPlan::new(&scenario.center_cuts, &scenario.category_cuts).apply(&matrix);
                let summary = summarize(&buckets);
                SimulationComparisonItem {
                    scenario_name: scenario.scenario_name.trim().to_string(),
                    baseline_total: summary.baseline_total,
                    projected_total: summary.projected_total,
                    estimated_savings: summary.estimated_savings,
                    impact_percent: summary.impact_percent,
                    rank: 0,
                }
            })
            .collect();

        items.sort_by(|a, b| {
            b.estimated_savings
                .cmp(&a.estimated_savings)
                .then(b.impact_percent.cmp(&a.impact_percent))
        });
        for (idx, item) in items.iter_mut().enumerate() {
            item.rank = idx + 1;
        }
        debug!(scenarios = items.len(), "Scenario comparison complete");

        Ok(SimulationComparisonResponse {
            period_start: request.start_date,
            period_end: request.end_date,
            best_scenario: items.first().map(|i| i.scenario_name.clone()),
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScenarioInput;
    use crate::services::testing::{matrix_row, FakeProvider};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn matrix() -> Vec<MatrixRow> {
        vec![
            matrix_row(1, "Operacoes", 1, "Logistica", dec!(1000)),
            matrix_row(1, "Operacoes", 2, "Energia", dec!(1000)),
            matrix_row(2, "Marketing", 1, "Logistica", dec!(1000)),
        ]
    }

    fn center(id: i64, pct: Decimal, abs: Decimal) -> CenterCut {
        CenterCut { cost_center_id: id, percent_cut: pct, absolute_cut: abs }
    }

    fn category(id: i64, pct: Decimal, abs: Decimal) -> CategoryCut {
        CategoryCut { category_id: id, percent_cut: pct, absolute_cut: abs }
    }

    fn request(center_cuts: Vec<CenterCut>, category_cuts: Vec<CategoryCut>) -> SimulationRequest {
        SimulationRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            center_cuts,
            category_cuts,
        }
    }

    #[test]
    fn test_center_percent_cut() {
        let provider = FakeProvider { matrix: matrix(), ..Default::default() };
        let result = SimulationService::new(&provider)
            .run(&request(vec![center(1, dec!(10), dec!(0))], vec![]))
            .unwrap();

        assert_eq!(result.baseline_total, dec!(3000));
        assert_eq!(result.projected_total, dec!(2800));
        assert_eq!(result.estimated_savings, dec!(200));
        assert_eq!(result.impact_percent, dec!(6.67));
        assert_eq!(result.center_impact_ranking[0].entity_id, 1);
        assert_eq!(result.center_impact_ranking[0].estimated_savings, dec!(200));
        assert_eq!(result.center_impact_ranking[0].impact_percent, dec!(10));
        assert_eq!(result.center_impact_ranking[1].estimated_savings, Decimal::ZERO);
    }

    #[test]
    fn test_zero_cuts_change_nothing() {
        let buckets = CutPlan::new(&[center(1, dec!(0), dec!(0))], &[category(1, dec!(0), dec!(0))]).apply(&matrix());
        let summary = summarize(&buckets);
        assert_eq!(summary.projected_total, summary.baseline_total);
        assert_eq!(summary.estimated_savings, Decimal::ZERO);
        assert_eq!(summary.impact_percent, Decimal::ZERO);
    }

    #[test]
    fn test_percent_cuts_compose_multiplicatively() {
        let plan = CutPlan::new(&[center(1, dec!(50), dec!(0))], &[category(1, dec!(50), dec!(0))]);
        assert_eq!(plan.combined_reduction(1, 1), dec!(0.75));

        let buckets = plan.apply(&matrix());
        assert_eq!(buckets[0].projected_amount, dec!(250));
        assert_eq!(buckets[1].projected_amount, dec!(500));
        assert_eq!(buckets[2].projected_amount, dec!(500));
    }

    #[test]
    fn test_full_cuts_never_exceed_baseline() {
        let plan = CutPlan::new(&[center(1, dec!(100), dec!(0))], &[category(1, dec!(100), dec!(0))]);
        assert_eq!(plan.combined_reduction(1, 1), Decimal::ONE);
        let summary = summarize(&plan.apply(&matrix()));
        assert_eq!(summary.projected_total, Decimal::ZERO);
        assert_eq!(summary.estimated_savings, dec!(3000));
        assert_eq!(summary.impact_percent, dec!(100));
    }

    #[test]
    fn test_absolute_cut_spreads_proportionally() {
        let buckets = CutPlan::new(&[center(1, dec!(0), dec!(500))], &[]).apply(&matrix());
        assert_eq!(buckets[0].projected_amount, dec!(750));
        assert_eq!(buckets[1].projected_amount, dec!(750));
        assert_eq!(buckets[2].projected_amount, dec!(1000));
    }

    #[test]
    fn test_absolute_cut_factor_capped_at_one() {
        let buckets = CutPlan::new(&[center(2, dec!(0), dec!(50000))], &[]).apply(&matrix());
        assert_eq!(buckets[2].projected_amount, Decimal::ZERO);
        assert!(buckets.iter().all(|b| b.projected_amount >= Decimal::ZERO));
    }

    #[test]
    fn test_absolute_applies_after_percent() {
        // 10% leaves 1800 for center 1, then 900 absolute halves it
        let buckets = CutPlan::new(&[center(1, dec!(10), dec!(900))], &[]).apply(&matrix());
        assert_eq!(buckets[0].projected_amount, dec!(450));
        assert_eq!(buckets[1].projected_amount, dec!(450));
    }

    #[test]
    fn test_center_absolute_runs_before_category_absolute() {
        let plan = CutPlan::new(&[center(1, dec!(0), dec!(1000))], &[category(1, dec!(0), dec!(750))]);
        let buckets = plan.apply(&matrix());
        // center stage: (1,1)=500 (1,2)=500; category stage sees 500 + 1000 for category 1
        assert_eq!(buckets[0].projected_amount, dec!(250));
        assert_eq!(buckets[1].projected_amount, dec!(500));
        assert_eq!(buckets[2].projected_amount, dec!(500));

        // reversing the stages gives a different answer
        let pct = plan.apply_percentage_cuts(&matrix());
        let cat_first = apply_absolute_cuts(&pct, &BTreeMap::from([(1, dec!(750))]), CutAxis::Category);
        let reversed = apply_absolute_cuts(&cat_first, &BTreeMap::from([(1, dec!(1000))]), CutAxis::CostCenter);
        assert!((reversed[1].projected_amount - dec!(500)).abs() > Decimal::ONE);
    }

    #[test]
    fn test_absolute_cut_on_empty_entity_is_skipped() {
        let buckets = CutPlan::new(&[center(99, dec!(0), dec!(100))], &[]).apply(&matrix());
        assert_eq!(summarize(&buckets).estimated_savings, Decimal::ZERO);
    }

    #[test]
    fn test_thirds_round_to_cents() {
        let rows = vec![matrix_row(1, "Ops", 1, "Fuel", dec!(100))];
        let buckets = CutPlan::new(&[center(1, dec!(0), dec!(33.335))], &[]).apply(&rows);
        let summary = summarize(&buckets);
        assert_eq!(summary.projected_total, dec!(66.66));
        assert_eq!(summary.estimated_savings, dec!(33.34));
        assert_eq!(summary.baseline_total - summary.projected_total, summary.estimated_savings);
    }

    #[test]
    fn test_stages_do_not_mutate_input() {
        let plan = CutPlan::new(&[center(1, dec!(20), dec!(0))], &[]);
        let pct = plan.apply_percentage_cuts(&matrix());
        let before = pct.clone();
        let _ = apply_absolute_cuts(&pct, &BTreeMap::from([(1, dec!(100))]), CutAxis::CostCenter);
        assert_eq!(pct, before);
    }

    #[test]
    fn test_empty_matrix_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.baseline_total, Decimal::ZERO);
        assert_eq!(summary.impact_percent, Decimal::ZERO);
        assert!(summary.center_impact_ranking.is_empty());
    }

    #[test]
    fn test_category_ranking_sorted_by_savings() {
        let buckets = CutPlan::new(&[], &[category(2, dec!(30), dec!(0)), category(1, dec!(10), dec!(0))]).apply(&matrix());
        let ranking = entity_ranking(&buckets, CutAxis::Category);
        assert_eq!(ranking[0].entity_id, 2);
        assert_eq!(ranking[0].estimated_savings, dec!(300));
        assert_eq!(ranking[1].entity_id, 1);
        assert_eq!(ranking[1].baseline_amount, dec!(2000));
        assert_eq!(ranking[1].estimated_savings, dec!(200));
    }

    #[test]
    fn test_compare_ranks_scenarios() {
        let provider = FakeProvider { matrix: matrix(), ..Default::default() };
        let req = ComparisonRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            scenarios: vec![
                ScenarioInput {
                    scenario_name: "Lean".into(),
                    center_cuts: vec![center(1, dec!(10), dec!(0))],
                    category_cuts: vec![],
                },
                ScenarioInput {
                    scenario_name: " Aggressive ".into(),
                    center_cuts: vec![center(1, dec!(30), dec!(0))],
                    category_cuts: vec![],
                },
            ],
        };
        let result = SimulationService::new(&provider).compare(&req).unwrap();

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.best_scenario.as_deref(), Some("Aggressive"));
        assert_eq!(result.items[0].rank, 1);
        assert_eq!(result.items[1].rank, 2);
        assert_eq!(result.items[0].estimated_savings, dec!(600));
        assert_eq!(result.items[1].estimated_savings, dec!(200));
        assert_eq!(result.items[1].baseline_total, dec!(3000));
    }

    #[test]
    fn test_compare_scenarios_share_baseline() {
        let provider = FakeProvider { matrix: matrix(), ..Default::default() };
        let scenario = |name: &str| ScenarioInput {
            scenario_name: name.into(),
            center_cuts: vec![center(1, dec!(0), dec!(2000))],
            category_cuts: vec![],
        };
        let req = ComparisonRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            scenarios: vec![scenario("First"), scenario("Second")],
        };
        let result = SimulationService::new(&provider).compare(&req).unwrap();
        assert_eq!(result.items[0].estimated_savings, dec!(2000));
        assert_eq!(result.items[1].estimated_savings, dec!(2000));
        assert_eq!(result.items[0].scenario_name, "First");
    }

    #[test]
    fn test_run_propagates_provider_failure() {
        let provider = FakeProvider { fail: true, ..Default::default() };
        let err = SimulationService::new(&provider)
            .run(&request(vec![center(1, dec!(10), dec!(0))], vec![]))
            .unwrap_err();
        assert!(matches!(err, CostIntelError::Database(_)));
    }
}
