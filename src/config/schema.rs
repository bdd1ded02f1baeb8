use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "server": {
                "type": "object",
                "properties": {
                    "host": { "type": "string", "minLength": 1 },
                    "port": { "type": "integer", "minimum": 1, "maximum": 65535 }
                }
            },
            "database": {
                "type": "object",
                "properties": {
                    "path": { "type": "string", "minLength": 1 }
                }
            },
            "cache": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "boolean" },
                    "ttl_seconds": { "type": "integer", "minimum": 1 },
                    "max_entries": { "type": "integer", "minimum": 1 }
                }
            },
            "auth": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "boolean" },
                    "header_name": { "type": "string", "minLength": 1 },
                    "api_keys": { "type": "array", "items": { "$ref": "#/$defs/api_key" } }
                }
            },
            "rate_limit": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "boolean" },
                    "max_requests": { "type": "integer", "minimum": 1 },
                    "window_seconds": { "type": "integer", "minimum": 1 }
                }
            },
            "cors": {
                "type": "object",
                "properties": {
                    "allowed_origins": { "type": "array", "items": { "type": "string" } }
                }
            }
        },
        "$defs": {
            "api_key": {
                "type": "object",
                "required": ["key"],
                "properties": {
                    "key": { "type": "string", "minLength": 1 },
                    "scopes": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "enum": ["*", "costs:read", "budgets:read", "analytics:read", "simulations:write"]
                        }
                    }
                }
            }
        }
    })
});
