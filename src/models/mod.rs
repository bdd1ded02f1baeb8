pub mod filters;
pub mod costs;
pub mod budgets;
pub mod analytics;
pub mod simulations;

pub use filters::*;
pub use costs::*;
pub use budgets::*;
pub use analytics::*;
pub use simulations::*;
