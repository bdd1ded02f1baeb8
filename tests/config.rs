use std::io::Write;

use costintel::config::parse_config;
use costintel::errors::CostIntelError;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_parse_full_config_file() {
    let file = write_config(
        r#"
server:
  host: 0.0.0.0
  port: 9100
database:
  path: /var/lib/costintel/costs.db
cache:
  ttl_seconds: 60
  max_entries: 256
auth:
  enabled: true
  api_keys:
    - key: dashboard-key-001
      scopes: [costs:read, budgets:read]
    - key: finance-key-002
rate_limit:
  enabled: true
  max_requests: 30
  window_seconds: 10
cors:
  allowed_origins: ["https://finance.example.com"]
"#,
    );

    let config = parse_config(file.path()).await.unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.database.path, "/var/lib/costintel/costs.db");
    assert!(config.cache.enabled);
    assert_eq!(config.cache.ttl_seconds, 60);
    assert_eq!(config.auth.api_keys.len(), 2);
    assert_eq!(config.auth.api_keys[0].scopes, vec!["costs:read", "budgets:read"]);
    assert_eq!(config.auth.api_keys[1].scopes, vec!["*"]);
    assert_eq!(config.rate_limit.max_requests, 30);
    assert_eq!(config.cors.allowed_origins, vec!["https://finance.example.com"]);
}

#[tokio::test]
async fn test_empty_file_yields_defaults() {
    let file = write_config("");
    let config = parse_config(file.path()).await.unwrap();
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.database.path, "costintel.db");
    assert!(!config.auth.enabled);
}

#[tokio::test]
async fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse_config(&dir.path().join("absent.yaml")).await.unwrap_err();
    assert!(matches!(err, CostIntelError::Config(_)));
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_oversized_file_rejected() {
    let padding = "# filler\n".repeat(120_000);
    let file = write_config(&padding);
    let err = parse_config(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("1MB"));
}

#[tokio::test]
async fn test_api_key_resolved_from_environment() {
    std::env::set_var("COSTINTEL_TEST_CONFIG_KEY", "resolved-secret-789");
    let file = write_config(
        r#"
auth:
  enabled: true
  api_keys:
    - key: $COSTINTEL_TEST_CONFIG_KEY
"#,
    );
    let config = parse_config(file.path()).await.unwrap();
    assert_eq!(config.auth.api_keys[0].key, "resolved-secret-789");
}

#[tokio::test]
async fn test_auth_enabled_without_keys_rejected() {
    let file = write_config("auth:\n  enabled: true\n");
    let err = parse_config(file.path()).await.unwrap_err();
    assert!(matches!(err, CostIntelError::Config(_)));
}

#[tokio::test]
async fn test_malformed_yaml_rejected() {
    let file = write_config("server: [unclosed\n");
    let err = parse_config(file.path()).await.unwrap_err();
    assert!(matches!(err, CostIntelError::Yaml(_)));
}
