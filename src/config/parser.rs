use std::collections::HashSet;
use std::path::Path;
use crate::errors::CostIntelError;
use super::credentials::resolve_credential;
use super::types::{ApiKeyConfig, AppConfig};
use super::schema::CONFIG_SCHEMA;
use tracing::{debug, warn};

pub const ENV_DB_PATH: &str = "COSTINTEL_DB_PATH";
pub const ENV_API_KEY: &str = "COSTINTEL_API_KEY";

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<AppConfig, CostIntelError> {
    if !path.exists() {
        return Err(CostIntelError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(CostIntelError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Parse, validate and resolve a YAML document. An empty document yields the
/// default configuration.
pub fn parse_config_str(content: &str) -> Result<AppConfig, CostIntelError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    let yaml = match yaml {
        serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
        other => other,
    };

    // JSON Schema validation
    validate_schema(&yaml)?;

    let mut config: AppConfig = serde_yaml::from_value(yaml)?;
    resolve_api_keys(&mut config);

    // Semantic conflict detection
    validate_conflicts(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), CostIntelError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| CostIntelError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| CostIntelError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only; typed deserialization and the conflict checks decide.
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}

fn resolve_api_keys(config: &mut AppConfig) {
    for entry in &mut config.auth.api_keys {
        entry.key = resolve_credential(&entry.key);
    }
}

/// Apply `COSTINTEL_*` environment overrides on top of a parsed config.
pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(path) = std::env::var(ENV_DB_PATH) {
        if !path.is_empty() {
            debug!(path = %path, "Database path overridden from environment");
            config.database.path = path;
        }
    }
    if let Ok(key) = std::env::var(ENV_API_KEY) {
        if !key.is_empty() {
            debug!("API key supplied from environment, enabling auth");
            config.auth.enabled = true;
            config.auth.api_keys.push(ApiKeyConfig {
                key,
                scopes: vec!["*".to_string()],
            });
        }
    }
}

/// Detect semantic conflicts in the parsed configuration.
pub fn validate_conflicts(config: &AppConfig) -> Result<(), CostIntelError> {
    if config.auth.enabled && config.auth.api_keys.is_empty() {
        return Err(CostIntelError::Config(
            "auth.enabled is true but no api_keys are configured".into(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in &config.auth.api_keys {
        if entry.key.trim().is_empty() {
            return Err(CostIntelError::Config("api_keys entries must not be empty".into()));
        }
        if !seen.insert(entry.key.as_str()) {
            return Err(CostIntelError::Config("Duplicate API key in auth.api_keys".into()));
        }
        if entry.key.starts_with('$') {
            warn!(key = %entry.key, "API key references an unset environment variable");
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.window_seconds == 0 {
            return Err(CostIntelError::Config("rate_limit.window_seconds must be > 0".into()));
        }
        if config.rate_limit.max_requests == 0 {
            return Err(CostIntelError::Config("rate_limit.max_requests must be > 0".into()));
        }
    }

    if config.cache.enabled && config.cache.max_entries == 0 {
        warn!("Cache enabled with max_entries = 0; responses will not be stored");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(config.cache.enabled);
        assert!(!config.auth.enabled);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = parse_config_str("cache:\n  ttl_seconds: 30\n").unwrap();
        assert_eq!(config.cache.ttl_seconds, 30);
        assert_eq!(config.cache.max_entries, 1024);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_auth_enabled_without_keys_rejected() {
        let err = parse_config_str("auth:\n  enabled: true\n").unwrap_err();
        assert!(matches!(err, CostIntelError::Config(_)));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let yaml = "auth:\n  enabled: true\n  api_keys:\n    - key: abc12345\n    - key: abc12345\n";
        assert!(parse_config_str(yaml).is_err());
    }

    #[test]
    fn test_zero_rate_limit_window_rejected() {
        let yaml = "rate_limit:\n  enabled: true\n  window_seconds: 0\n";
        assert!(parse_config_str(yaml).is_err());
    }

    #[test]
    fn test_api_key_resolved_from_env() {
        std::env::set_var("TEST_COSTINTEL_PARSER_KEY", "resolved-key");
        let yaml = "auth:\n  enabled: true\n  api_keys:\n    - key: $TEST_COSTINTEL_PARSER_KEY\n      scopes: [\"costs:read\"]\n";
        let config = parse_config_str(yaml).unwrap();
        std::env::remove_var("TEST_COSTINTEL_PARSER_KEY");
        assert_eq!(config.auth.api_keys[0].key, "resolved-key");
        assert_eq!(config.auth.api_keys[0].scopes, vec!["costs:read".to_string()]);
    }

    #[test]
    fn test_key_scopes_default_to_wildcard() {
        let yaml = "auth:\n  enabled: true\n  api_keys:\n    - key: abc12345\n";
        let config = parse_config_str(yaml).unwrap();
        assert_eq!(config.auth.api_keys[0].scopes, vec!["*".to_string()]);
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let err = parse_config_str("server: [unclosed").unwrap_err();
        assert!(matches!(err, CostIntelError::Yaml(_)));
    }
}
