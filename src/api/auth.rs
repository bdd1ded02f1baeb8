use std::collections::HashSet;
use std::fmt;

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::{credentials::mask_key, AuthConfig};
use crate::errors::CostIntelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    CostsRead,
    BudgetsRead,
    AnalyticsRead,
    SimulationsWrite,
}

impl Scope {
    pub const ALL: [Scope; 4] = [
        Scope::CostsRead,
        Scope::BudgetsRead,
        Scope::AnalyticsRead,
        Scope::SimulationsWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CostsRead => "costs:read",
            Self::BudgetsRead => "budgets:read",
            Self::AnalyticsRead => "analytics:read",
            Self::SimulationsWrite => "simulations:write",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value.trim())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct Principal {
    pub key_id: String,
    pub scopes: HashSet<Scope>,
}

impl Principal {
    fn anonymous() -> Self {
        Self {
            key_id: "anonymous".to_string(),
            scopes: Scope::ALL.into_iter().collect(),
        }
    }

    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }
}

#[derive(Debug, Clone)]
struct KeyEntry {
    key: String,
    scopes: HashSet<Scope>,
}

/// Resolves API keys from request headers into principals.
#[derive(Debug, Clone)]
pub struct ApiKeyAuthorizer {
    enabled: bool,
    header_name: String,
    keys: Vec<KeyEntry>,
}

impl ApiKeyAuthorizer {
    pub fn new(config: &AuthConfig) -> Self {
        let keys = config
            .api_keys
            .iter()
            .map(|entry| KeyEntry {
                key: entry.key.clone(),
                scopes: expand_scopes(&entry.scopes),
            })
            .collect();
        Self {
            enabled: config.enabled,
            header_name: config.header_name.to_ascii_lowercase(),
            keys,
        }
    }

    pub fn disabled() -> Self {
        Self::new(&AuthConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, CostIntelError> {
        if !self.enabled {
            return Ok(Principal::anonymous());
        }

        let provided = headers
            .get(self.header_name.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CostIntelError::Authentication("Missing API key".into()))?;

        // Compare against every key so timing does not depend on which one matched.
        let mut matched: Option<&KeyEntry> = None;
        for entry in &self.keys {
            if keys_match(entry.key.as_bytes(), provided.as_bytes()) && matched.is_none() {
                matched = Some(entry);
            }
        }

        match matched {
            Some(entry) => Ok(Principal {
                key_id: mask_key(&entry.key),
                scopes: entry.scopes.clone(),
            }),
            None => Err(CostIntelError::Authentication("Invalid API key".into())),
        }
    }

    /// Authenticate and check that the caller holds `scope`.
    pub fn require_scope(&self, headers: &HeaderMap, scope: Scope) -> Result<Principal, CostIntelError> {
        let principal = self.authenticate(headers)?;
        if !principal.has_scope(scope) {
            debug!(key = %principal.key_id, scope = %scope, "Scope denied");
            return Err(CostIntelError::Permission(format!("Missing required scope: {}", scope)));
        }
        Ok(principal)
    }
}

fn expand_scopes(names: &[String]) -> HashSet<Scope> {
    if names.iter().any(|s| s.trim() == "*") {
        return Scope::ALL.into_iter().collect();
    }
    names.iter().filter_map(|s| Scope::parse(s)).collect()
}

/// Length leaks; content does not.
fn keys_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
