use axum::http::StatusCode;

use super::types::CostIntelError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub code: &'static str,
    pub status: StatusCode,
}

impl CostIntelError {
    /// Classify this error into the client-visible error code and HTTP status.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Caller mistakes
            CostIntelError::Validation(_) => ErrorClassification {
                code: "domain_validation_error",
                status: StatusCode::UNPROCESSABLE_ENTITY,
            },
            CostIntelError::BadRequest(_) => ErrorClassification {
                code: "bad_request",
                status: StatusCode::BAD_REQUEST,
            },
            CostIntelError::Authentication(_) => ErrorClassification {
                code: "authentication_error",
                status: StatusCode::UNAUTHORIZED,
            },
            CostIntelError::Permission(_) => ErrorClassification {
                code: "authorization_error",
                status: StatusCode::FORBIDDEN,
            },
            CostIntelError::RateLimit { .. } => ErrorClassification {
                code: "rate_limited",
                status: StatusCode::TOO_MANY_REQUESTS,
            },

            // Provider failures are passed through, never retried here
            CostIntelError::Database(_) => ErrorClassification {
                code: "service_unavailable",
                status: StatusCode::SERVICE_UNAVAILABLE,
            },

            CostIntelError::Config(_)
            | CostIntelError::Io(_)
            | CostIntelError::Json(_)
            | CostIntelError::Yaml(_)
            | CostIntelError::Internal(_) => ErrorClassification {
                code: "internal_error",
                status: StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            CostIntelError::Config(_) | CostIntelError::Yaml(_) => 2,
            CostIntelError::Validation(_) | CostIntelError::BadRequest(_) => 3,
            CostIntelError::Database(_) => 4,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_422() {
        let c = CostIntelError::validation("start_date must be <= end_date").classify();
        assert_eq!(c.code, "domain_validation_error");
        assert_eq!(c.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_database_maps_to_service_unavailable() {
        let c = CostIntelError::Database("disk I/O error".into()).classify();
        assert_eq!(c.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(c.code, "service_unavailable");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CostIntelError::Config("x".into()).exit_code(), 2);
        assert_eq!(CostIntelError::validation("x").exit_code(), 3);
        assert_eq!(CostIntelError::Database("x".into()).exit_code(), 4);
        assert_eq!(CostIntelError::Internal("x".into()).exit_code(), 1);
    }
}
