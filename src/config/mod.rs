pub mod credentials;
pub mod parser;
pub mod schema;
pub mod types;

pub use types::*;
pub use parser::{apply_env_overrides, parse_config, parse_config_str, validate_conflicts};
