use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::filters::validate_date_range;
use crate::errors::CostIntelError;

pub const MIN_SCENARIOS: usize = 2;
pub const MAX_SCENARIOS: usize = 10;
pub const MAX_SCENARIO_NAME_LEN: usize = 80;

/// Hypothetical reduction targeting one cost center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterCut {
    pub cost_center_id: i64,
    #[serde(default)]
    pub percent_cut: Decimal,
    #[serde(default)]
    pub absolute_cut: Decimal,
}

/// Hypothetical reduction targeting one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCut {
    pub category_id: i64,
    #[serde(default)]
    pub percent_cut: Decimal,
    #[serde(default)]
    pub absolute_cut: Decimal,
}

/// Common view over center and category cuts.
pub trait Cut {
    fn entity_id(&self) -> i64;
    fn percent_cut(&self) -> Decimal;
    fn absolute_cut(&self) -> Decimal;

    fn is_active(&self) -> bool {
        self.percent_cut() > Decimal::ZERO || self.absolute_cut() > Decimal::ZERO
    }
}

impl Cut for CenterCut {
    fn entity_id(&self) -> i64 {
        self.cost_center_id
    }
    fn percent_cut(&self) -> Decimal {
        self.percent_cut
    }
    fn absolute_cut(&self) -> Decimal {
        self.absolute_cut
    }
}

impl Cut for CategoryCut {
    fn entity_id(&self) -> i64 {
        self.category_id
    }
    fn percent_cut(&self) -> Decimal {
        self.percent_cut
    }
    fn absolute_cut(&self) -> Decimal {
        self.absolute_cut
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub center_cuts: Vec<CenterCut>,
    #[serde(default)]
    pub category_cuts: Vec<CategoryCut>,
}

impl SimulationRequest {
    pub fn validate(&self) -> Result<(), CostIntelError> {
        validate_date_range(self.start_date, self.end_date)?;
        validate_cut_set(&self.center_cuts, &self.category_cuts)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub scenario_name: String,
    #[serde(default)]
    pub center_cuts: Vec<CenterCut>,
    #[serde(default)]
    pub category_cuts: Vec<CategoryCut>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub scenarios: Vec<ScenarioInput>,
}

impl ComparisonRequest {
    pub fn validate(&self) -> Result<(), CostIntelError> {
        validate_date_range(self.start_date, self.end_date)?;

        let count = self.scenarios.len();
        if !(MIN_SCENARIOS..=MAX_SCENARIOS).contains(&count) {
            return Err(CostIntelError::validation(format!(
                "Between {} and {} scenarios are required, got {}",
                MIN_SCENARIOS, MAX_SCENARIOS, count
            )));
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            let name = scenario.scenario_name.trim();
            if name.is_empty() {
                return Err(CostIntelError::validation("scenario_name must not be empty"));
            }
            if name.chars().count() > MAX_SCENARIO_NAME_LEN {
                return Err(CostIntelError::validation(format!(
                    "scenario_name exceeds {} characters",
                    MAX_SCENARIO_NAME_LEN
                )));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(CostIntelError::validation(format!(
                    "Duplicate scenario name: {}",
                    name
                )));
            }
            validate_cut_set(&scenario.center_cuts, &scenario.category_cuts).map_err(|e| {
                CostIntelError::validation(format!("Scenario '{}': {}", name, e))
            })?;
        }
        Ok(())
    }
}

fn validate_cut_set(center_cuts: &[CenterCut], category_cuts: &[CategoryCut]) -> Result<(), CostIntelError> {
    validate_cut_list("center_cuts", center_cuts)?;
    validate_cut_list("category_cuts", category_cuts)?;

    let any_active = center_cuts.iter().any(Cut::is_active) || category_cuts.iter().any(Cut::is_active);
    if !any_active {
        return Err(CostIntelError::validation(
            "At least one cut (center or category) must be provided.",
        ));
    }
    Ok(())
}

fn validate_cut_list<C: Cut>(field: &str, cuts: &[C]) -> Result<(), CostIntelError> {
    let mut ids = HashSet::new();
    for cut in cuts {
        if !ids.insert(cut.entity_id()) {
            return Err(CostIntelError::validation(format!(
                "Duplicate entity id {} in {}",
                cut.entity_id(),
                field
            )));
        }
        let pct = cut.percent_cut();
        if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(CostIntelError::validation(format!(
                "percent_cut must be between 0 and 100 in {}",
                field
            )));
        }
        if cut.absolute_cut() < Decimal::ZERO {
            return Err(CostIntelError::validation(format!(
                "absolute_cut must be >= 0 in {}",
                field
            )));
        }
    }
    Ok(())
}

/// Per-entity outcome of a simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactRankingItem {
    pub entity_id: i64,
    pub entity_name: String,
    pub baseline_amount: Decimal,
    pub projected_amount: Decimal,
    pub estimated_savings: Decimal,
    pub impact_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub baseline_total: Decimal,
    pub projected_total: Decimal,
    pub estimated_savings: Decimal,
    pub impact_percent: Decimal,
    pub center_impact_ranking: Vec<ImpactRankingItem>,
    pub category_impact_ranking: Vec<ImpactRankingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationComparisonItem {
    pub scenario_name: String,
    pub baseline_total: Decimal,
    pub projected_total: Decimal,
    pub estimated_savings: Decimal,
    pub impact_percent: Decimal,
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationComparisonResponse {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub best_scenario: Option<String>,
    pub items: Vec<SimulationComparisonItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn center(id: i64, pct: Decimal) -> CenterCut {
        CenterCut { cost_center_id: id, percent_cut: pct, absolute_cut: Decimal::ZERO }
    }

    fn scenario(name: &str) -> ScenarioInput {
        ScenarioInput {
            scenario_name: name.to_string(),
            center_cuts: vec![center(1, dec!(10))],
            category_cuts: vec![],
        }
    }

    #[test]
    fn test_cut_amounts_are_plain_json_numbers() {
        let cut: CenterCut = serde_json::from_str(r#"{"cost_center_id": 3, "percent_cut": 12.5}"#).unwrap();
        assert_eq!(cut.percent_cut, dec!(12.5));
        assert_eq!(cut.absolute_cut, Decimal::ZERO);

        let json = serde_json::to_value(&cut).unwrap();
        assert_eq!(json["percent_cut"], serde_json::json!(12.5));
    }

    #[test]
    fn test_request_requires_a_non_zero_cut() {
        let req = SimulationRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            center_cuts: vec![center(1, dec!(0))],
            category_cuts: vec![],
        };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("At least one cut"));
    }

    #[test]
    fn test_request_rejects_duplicate_center_ids() {
        let req = SimulationRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            center_cuts: vec![center(1, dec!(5)), center(1, dec!(10))],
            category_cuts: vec![],
        };
        assert!(req.validate().unwrap_err().to_string().contains("Duplicate entity id 1"));
    }

    #[test]
    fn test_request_allows_same_id_across_lists() {
        let req = SimulationRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            center_cuts: vec![center(1, dec!(5))],
            category_cuts: vec![CategoryCut { category_id: 1, percent_cut: dec!(5), absolute_cut: Decimal::ZERO }],
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_request_rejects_percent_above_100() {
        let req = SimulationRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            center_cuts: vec![center(1, dec!(120))],
            category_cuts: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_request_rejects_inverted_dates() {
        let req = SimulationRequest {
            start_date: d(2025, 2, 1),
            end_date: d(2025, 1, 31),
            center_cuts: vec![center(1, dec!(10))],
            category_cuts: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_comparison_scenario_count_bounds() {
        let one = ComparisonRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            scenarios: vec![scenario("A")],
        };
        assert!(one.validate().is_err());

        let eleven = ComparisonRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            scenarios: (0..11).map(|i| scenario(&format!("S{}", i))).collect(),
        };
        assert!(eleven.validate().is_err());
    }

    #[test]
    fn test_comparison_names_unique_case_insensitive_trimmed() {
        let req = ComparisonRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            scenarios: vec![scenario("Lean"), scenario("  lean ")],
        };
        assert!(req.validate().unwrap_err().to_string().contains("Duplicate scenario name"));
    }

    #[test]
    fn test_comparison_valid() {
        let req = ComparisonRequest {
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
            scenarios: vec![scenario("Lean"), scenario("Aggressive")],
        };
        assert!(req.validate().is_ok());
    }
}
