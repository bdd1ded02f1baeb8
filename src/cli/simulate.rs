use console::style;
use serde::Deserialize;
use tracing::info;

use crate::cli::commands::SimulateArgs;
use crate::db::Database;
use crate::errors::CostIntelError;
use crate::models::{
    ComparisonRequest, ImpactRankingItem, SimulationComparisonResponse, SimulationRequest, SimulationResponse,
};
use crate::services::SimulationService;
use crate::utils::formatting::{format_currency, format_percent, truncate};

/// Contents of a `--input` file. A document with `scenarios` is a comparison.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SimulationInput {
    Compare(ComparisonRequest),
    Run(SimulationRequest),
}

pub fn parse_input(content: &str) -> Result<SimulationInput, CostIntelError> {
    serde_json::from_str(content)
        .map_err(|e| CostIntelError::validation(format!("Input is neither a simulation nor a comparison request: {}", e)))
}

pub async fn handle_simulate(args: SimulateArgs) -> Result<(), CostIntelError> {
    if !std::path::Path::new(&args.db).exists() {
        return Err(CostIntelError::Config(format!("Database not found: {}", args.db)));
    }
    let content = tokio::fs::read_to_string(&args.input).await?;
    let input = parse_input(&content)?;
    let db_path = args.db.clone();

    let output = tokio::task::spawn_blocking(move || -> Result<SimulationOutput, CostIntelError> {
        let db = Database::new(&db_path)?;
        let service = SimulationService::new(&db);
        match input {
            SimulationInput::Run(request) => {
                request.validate()?;
                info!(db = %db_path, "Running simulation");
                Ok(SimulationOutput::Run(service.run(&request)?))
            }
            SimulationInput::Compare(request) => {
                request.validate()?;
                info!(db = %db_path, scenarios = request.scenarios.len(), "Comparing scenarios");
                Ok(SimulationOutput::Compare(service.compare(&request)?))
            }
        }
    })
    .await
    .map_err(|e| CostIntelError::Internal(format!("Simulation task failed: {}", e)))??;

    if args.json {
        let json = match &output {
            SimulationOutput::Run(r) => serde_json::to_string_pretty(r)?,
            SimulationOutput::Compare(r) => serde_json::to_string_pretty(r)?,
        };
        println!("{}", json);
    } else {
        match &output {
            SimulationOutput::Run(r) => print_simulation(r),
            SimulationOutput::Compare(r) => print_comparison(r),
        }
    }
    Ok(())
}

enum SimulationOutput {
    Run(SimulationResponse),
    Compare(SimulationComparisonResponse),
}

fn print_simulation(result: &SimulationResponse) {
    println!("{}", style("Simulation").white().bold());
    println!("  Baseline:   {:>16}", format_currency(result.baseline_total));
    println!("  Projected:  {:>16}", format_currency(result.projected_total));
    println!(
        "  Savings:    {:>16}  ({})",
        style(format_currency(result.estimated_savings)).green(),
        format_percent(result.impact_percent)
    );
    print_ranking("Cost centers", &result.center_impact_ranking);
    print_ranking("Categories", &result.category_impact_ranking);
}

fn print_ranking(title: &str, items: &[ImpactRankingItem]) {
    println!();
    println!("{}", style(title).white().bold());
    println!("  {:<28} {:>16} {:>16} {:>9}", "Name", "Baseline", "Savings", "Impact");
    for item in items {
        println!(
            "  {:<28} {:>16} {:>16} {:>9}",
            truncate(&item.entity_name, 28),
            format_currency(item.baseline_amount),
            format_currency(item.estimated_savings),
            format_percent(item.impact_percent)
        );
    }
}

fn print_comparison(result: &SimulationComparisonResponse) {
    println!(
        "{} {} .. {}",
        style("Scenario comparison").white().bold(),
        result.period_start,
        result.period_end
    );
    println!("  {:>4}  {:<28} {:>16} {:>9}", "Rank", "Scenario", "Savings", "Impact");
    for item in &result.items {
        let name = format!("{:<28}", truncate(&item.scenario_name, 28));
        let name = if item.rank == 1 { style(name).green().bold().to_string() } else { name };
        println!(
            "  {:>4}  {} {:>16} {:>9}",
            item.rank,
            name,
            format_currency(item.estimated_savings),
            format_percent(item.impact_percent)
        );
    }
    if let Some(best) = &result.best_scenario {
        println!();
        println!("  Best scenario: {}", style(best).green().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_input() {
        let input = parse_input(
            r#"{"start_date":"2025-01-01","end_date":"2025-01-31","center_cuts":[{"cost_center_id":1,"percent_cut":10}]}"#,
        )
        .unwrap();
        match input {
            SimulationInput::Run(req) => assert_eq!(req.center_cuts[0].percent_cut, rust_decimal::Decimal::TEN),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_compare_input() {
        let input = parse_input(
            r#"{"start_date":"2025-01-01","end_date":"2025-01-31","scenarios":[
                {"scenario_name":"A","center_cuts":[{"cost_center_id":1,"percent_cut":5}]},
                {"scenario_name":"B","category_cuts":[{"category_id":2,"absolute_cut":100}]}
            ]}"#,
        )
        .unwrap();
        match input {
            SimulationInput::Compare(req) => assert_eq!(req.scenarios.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_input("{\"foo\": 1}"), Err(CostIntelError::Validation(_))));
    }
}
