//! Reporting services. Each service borrows a [`CostDataProvider`] and turns
//! its aggregate rows into report payloads.

pub mod analytics;
pub mod budgets;
pub mod costs;
pub mod provider;
pub mod simulation;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use analytics::{AnalyticsService, AnomalyQuery, QuickWinQuery};
pub use budgets::{BudgetService, VarianceQuery};
pub use costs::CostService;
pub use provider::CostDataProvider;
pub use simulation::SimulationService;
