use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gateway_core::GatewayError;
use serde::Serialize;

const HIDDEN_DETAILS: &str = "see server logs";

/// JSON body of every failed generation request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

/// A failure on the HTTP generation path. Always rendered as `500`.
#[derive(Debug)]
pub struct ApiError {
    summary: &'static str,
    detail: String,
    expose: bool,
}

impl ApiError {
    pub fn new(summary: &'static str, detail: impl Into<String>, expose: bool) -> Self {
        Self { summary, detail: detail.into(), expose }
    }

    pub fn from_gateway(err: &GatewayError, expose: bool) -> Self {
        let summary = match err {
            GatewayError::Config(_) => "Gateway is not configured",
            GatewayError::InvalidRequest(_) => "Invalid generation request",
            GatewayError::UpstreamHttp { .. } | GatewayError::Request(_) => "Upstream request failed",
            GatewayError::GenerationFailed(_) => "Generation failed",
            GatewayError::PollTimeout { .. } => "Generation timed out",
            GatewayError::Auth(_) => "Authentication failed",
            GatewayError::Connection(_) | GatewayError::Serialization(_) => "Generation failed",
        };
        Self::new(summary, err.to_string(), expose)
    }

    pub fn body(&self) -> ErrorBody {
        let details = if self.expose { self.detail.clone() } else { HIDDEN_DETAILS.to_string() };
        ErrorBody { error: self.summary.to_string(), details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.summary, details = %self.detail, "Generation request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_hidden_unless_exposed() {
        let err = GatewayError::upstream(403, "permission denied on project");
        let hidden = ApiError::from_gateway(&err, false).body();
        assert_eq!(hidden.error, "Upstream request failed");
        assert_eq!(hidden.details, HIDDEN_DETAILS);

        let shown = ApiError::from_gateway(&err, true).body();
        assert!(shown.details.contains("403"));
        assert!(shown.details.contains("permission denied"));
    }

    #[test]
    fn test_timeout_distinct_from_failure() {
        let timeout = GatewayError::PollTimeout { operation: "ops/1".into(), attempts: 30 };
        let failed = GatewayError::generation("boom");
        assert_ne!(ApiError::from_gateway(&timeout, true).body().error, ApiError::from_gateway(&failed, true).body().error);
    }

    #[test]
    fn test_status_is_500() {
        let response = ApiError::new("Generation failed", "x", false).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
