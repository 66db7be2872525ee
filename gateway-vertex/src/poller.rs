//! Asynchronous video generation: start a job, then poll it to completion.

use crate::http::{model_method_url, post_json};
use crate::media::{ReferenceImage, find_video_payload};
use crate::operation::{Operation, OperationOutcome, PollPolicy};
use crate::response::NormalizedResponse;
use async_trait::async_trait;
use gateway_core::{GatewayConfig, GatewayError, ModelDescriptor, Result};
use serde_json::{Value, json};
use std::sync::Arc;

/// Input for one video job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub prompt: String,
    pub image: Option<ReferenceImage>,
}

impl VideoRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), image: None }
    }

    pub fn with_image(mut self, image: ReferenceImage) -> Self {
        self.image = Some(image);
        self
    }

    fn to_payload(&self) -> Result<Value> {
        let mut instance = json!({ "prompt": self.prompt });
        if let Some(image) = &self.image {
            instance["image"] = serde_json::to_value(image)?;
        }
        Ok(json!({
            "instances": [instance],
            "parameters": { "sampleCount": 1, "aspectRatio": "16:9" }
        }))
    }
}

/// The two upstream calls a video job needs.
#[async_trait]
pub trait OperationBackend: Send + Sync {
    /// Start the job and return its operation name.
    async fn start(&self, token: &str, descriptor: &ModelDescriptor, request: &VideoRequest) -> Result<String>;

    /// Fetch the current state of a job.
    async fn fetch(&self, token: &str, descriptor: &ModelDescriptor, operation: &str) -> Result<Operation>;
}

/// Backend speaking `:predictLongRunning` / `:fetchPredictOperation`.
#[derive(Debug, Clone)]
pub struct VertexOperationBackend {
    config: Arc<GatewayConfig>,
    http: reqwest::Client,
}

impl VertexOperationBackend {
    pub fn new(config: Arc<GatewayConfig>, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn url(&self, descriptor: &ModelDescriptor, method: &str) -> Result<String> {
        let project = self.config.require_project()?;
        Ok(model_method_url(&self.config.api_base(&descriptor.region), descriptor, project, method))
    }
}

#[async_trait]
impl OperationBackend for VertexOperationBackend {
    async fn start(&self, token: &str, descriptor: &ModelDescriptor, request: &VideoRequest) -> Result<String> {
        let url = self.url(descriptor, "predictLongRunning")?;
        let body = post_json(&self.http, &url, token, &request.to_payload()?).await?;
        body.get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::generation("video job started without an operation name"))
    }

    async fn fetch(&self, token: &str, descriptor: &ModelDescriptor, operation: &str) -> Result<Operation> {
        let url = self.url(descriptor, "fetchPredictOperation")?;
        let body = post_json(&self.http, &url, token, &json!({ "operationName": operation })).await?;
        serde_json::from_value(body)
            .map_err(|e| GatewayError::request(format!("unreadable operation status: {e}")))
    }
}

/// Drives one video job from start to a terminal state.
#[derive(Clone)]
pub struct LongRunningOperationPoller {
    backend: Arc<dyn OperationBackend>,
    policy: PollPolicy,
}

impl LongRunningOperationPoller {
    pub fn new(backend: Arc<dyn OperationBackend>) -> Self {
        Self { backend, policy: PollPolicy::default() }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Start a job and poll it until it succeeds, fails, or runs out of attempts.
    ///
    /// A failed start is returned as-is. Status calls that fail at the
    /// transport level consume an attempt and are otherwise ignored; any
    /// other status error, or a finished operation carrying an `error`,
    /// ends the loop immediately.
    pub async fn generate_video(
        &self,
        token: &str,
        descriptor: &ModelDescriptor,
        request: &VideoRequest,
    ) -> Result<NormalizedResponse> {
        let operation = self.backend.start(token, descriptor, request).await?;
        tracing::info!(model = %descriptor.resolved_id, operation = %operation, "Video job started");

        let mut attempts = 0;
        for delay in self.policy.delays() {
            attempts += 1;
            tokio::time::sleep(delay).await;

            let status = match self.backend.fetch(token, descriptor, &operation).await {
                Ok(status) => status,
                Err(e) if e.is_transient() => {
                    tracing::warn!(operation = %operation, attempt = attempts, error = %e, "Poll attempt failed");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(operation = %operation, attempt = attempts, error = %e, "Polling aborted");
                    return Err(e);
                }
            };

            match status.outcome() {
                OperationOutcome::Pending => {
                    tracing::debug!(operation = %operation, attempt = attempts, "Video job still running");
                }
                OperationOutcome::Failed(message) => {
                    tracing::warn!(operation = %operation, error = %message, "Video job failed");
                    return Err(GatewayError::generation(message));
                }
                OperationOutcome::Succeeded(response) => {
                    let payload = find_video_payload(&response).ok_or_else(|| {
                        GatewayError::generation("operation completed without video data")
                    })?;
                    tracing::info!(operation = %operation, attempt = attempts, "Video job completed");
                    return Ok(NormalizedResponse::from_text(payload.to_markdown_download()));
                }
            }
        }

        Err(GatewayError::PollTimeout { operation, attempts })
    }
}
