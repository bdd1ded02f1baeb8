use axum::{http::HeaderValue, response::IntoResponse, Json};
use serde_json::json;
use tracing::{error, warn};
use crate::errors::CostIntelError;

impl IntoResponse for CostIntelError {
    fn into_response(self) -> axum::response::Response {
        let classification = self.classify();

        let message = if classification.status.is_server_error() {
            match &self {
                CostIntelError::Database(_) => warn!(error = %self, "Data provider unavailable"),
                _ => error!(error = %self, "Request failed"),
            }
            match &self {
                CostIntelError::Database(_) => "Cost data is temporarily unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": classification.code,
                "message": message,
            }
        }));
        let mut response = (classification.status, body).into_response();

        if let CostIntelError::RateLimit { retry_after_secs } = self {
            response
                .headers_mut()
                .insert("retry-after", HeaderValue::from(retry_after_secs));
        }
        response
    }
}
