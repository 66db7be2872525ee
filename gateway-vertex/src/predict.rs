use crate::http::{model_method_url, post_json};
use crate::media::{DEFAULT_IMAGE_MIME, extract_image_prediction};
use crate::response::NormalizedResponse;
use gateway_core::{GatewayConfig, GatewayError, ModelDescriptor, Result};
use serde_json::{Value, json};
use std::sync::Arc;

/// One-shot image generation through the `:predict` method.
#[derive(Debug, Clone)]
pub struct SyncPredictClient {
    config: Arc<GatewayConfig>,
    http: reqwest::Client,
}

impl SyncPredictClient {
    pub fn new(config: Arc<GatewayConfig>, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Generate a single square JPEG and return it as an inline Markdown image.
    pub async fn generate_image(
        &self,
        token: &str,
        descriptor: &ModelDescriptor,
        prompt: &str,
    ) -> Result<NormalizedResponse> {
        let project = self.config.require_project()?;
        let url = model_method_url(&self.config.api_base(&descriptor.region), descriptor, project, "predict");

        tracing::debug!(model = %descriptor.resolved_id, region = %descriptor.region, "Image predict");
        let response = post_json(&self.http, &url, token, &predict_payload(prompt)).await?;

        let image = extract_image_prediction(&response)
            .ok_or_else(|| GatewayError::generation("no image data in predict response"))?;
        Ok(NormalizedResponse::from_text(image.to_markdown_image()))
    }
}

fn predict_payload(prompt: &str) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": "1:1",
            "outputOptions": { "mimeType": DEFAULT_IMAGE_MIME }
        }
    })
}
