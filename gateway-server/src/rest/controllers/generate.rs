use crate::ServerConfig;
use crate::error::ApiError;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use gateway_vertex::{GenerationDispatcher, GenerationOutput, GenerationRequest};
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct GenerateController {
    dispatcher: Arc<GenerationDispatcher>,
    request_timeout: Duration,
    expose_error_details: bool,
}

impl GenerateController {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            dispatcher: config.dispatcher.clone(),
            request_timeout: config.security.request_timeout,
            expose_error_details: config.security.expose_error_details,
        }
    }
}

/// `POST /api/generate`
///
/// The dispatch runs on its own task: a client that disconnects mid-request
/// does not cancel an in-flight video poll. A dispatch that outlives the
/// request timeout answers `500` and keeps running detached.
pub async fn generate(
    State(controller): State<GenerateController>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationOutput>, ApiError> {
    let expose = controller.expose_error_details;
    let Json(request) =
        body.map_err(|e| ApiError::new("Invalid generation request", e.body_text(), expose))?;

    tracing::info!(model = %request.model, "Generation request");
    let dispatcher = controller.dispatcher.clone();
    let task = tokio::spawn(async move { dispatcher.dispatch(&request).await });
    let output = tokio::time::timeout(controller.request_timeout, task)
        .await
        .map_err(|_| {
            let limit = controller.request_timeout;
            ApiError::new("Generation timed out", format!("no result within {limit:?}"), expose)
        })?
        .map_err(|e| ApiError::new("Generation failed", e.to_string(), expose))?
        .map_err(|e| ApiError::from_gateway(&e, expose))?;

    Ok(Json(output))
}
