pub mod types;
pub mod classification;

pub use types::CostIntelError;
pub use classification::ErrorClassification;
