use tracing::debug;

/// Resolve an API key value. If the value starts with '$', treat it as an
/// environment variable reference and resolve from the environment.
pub fn resolve_credential(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        match std::env::var(var_name) {
            Ok(resolved) => {
                debug!(var = %var_name, "Resolved API key from environment");
                resolved
            }
            Err(_) => {
                debug!(var = %var_name, "Environment variable not set, using literal");
                value.to_string()
            }
        }
    } else {
        value.to_string()
    }
}

/// Log-safe rendering of a key: first four characters, the rest masked.
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_credential_literal() {
        assert_eq!(resolve_credential("plain-key"), "plain-key");
    }

    #[test]
    fn test_resolve_credential_env_var() {
        std::env::set_var("TEST_COSTINTEL_KEY", "secret123");
        assert_eq!(resolve_credential("$TEST_COSTINTEL_KEY"), "secret123");
        std::env::remove_var("TEST_COSTINTEL_KEY");
    }

    #[test]
    fn test_resolve_credential_missing_env_var() {
        let result = resolve_credential("$NONEXISTENT_COSTINTEL_VAR");
        assert_eq!(result, "$NONEXISTENT_COSTINTEL_VAR");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abcdef123"), "abcd****");
        assert_eq!(mask_key("abc"), "****");
    }
}
