//! Routes generation requests to the backend matching the model family.

use crate::client::RegionalClientCache;
use crate::media::ReferenceImage;
use crate::operation::PollPolicy;
use crate::poller::{LongRunningOperationPoller, OperationBackend, VertexOperationBackend, VideoRequest};
use crate::predict::SyncPredictClient;
use crate::response::GenerationOutput;
use gateway_core::{
    GatewayConfig, GatewayError, ModelDescriptor, ModelFamily, ModelResolver, Result, SharedTokenProvider,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Body of a generation request as sent by clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    /// Reference image for video jobs, raw base64 or a `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Region override for chat models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), ..Default::default() }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    fn require_prompt(&self) -> Result<&str> {
        self.prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| GatewayError::invalid_request(format!("model '{}' requires a prompt", self.model)))
    }

    /// `generateContent` body: explicit contents or a single synthesized user
    /// turn, plus `systemInstruction` and `tools` only when given.
    fn chat_body(&self) -> Result<Value> {
        let contents = match (&self.contents, &self.prompt) {
            (Some(contents), _) => Value::Array(contents.clone()),
            (None, Some(prompt)) => json!([{ "role": "user", "parts": [{ "text": prompt }] }]),
            (None, None) => return Err(GatewayError::invalid_request("either contents or prompt is required")),
        };

        let mut body = Map::new();
        body.insert("contents".to_string(), contents);
        if let Some(instruction) = &self.system_instruction {
            body.insert("systemInstruction".to_string(), instruction.clone());
        }
        if let Some(tools) = &self.tools {
            body.insert("tools".to_string(), Value::Array(tools.clone()));
        }
        Ok(Value::Object(body))
    }
}

/// Entry point for `POST /api/generate`.
pub struct GenerationDispatcher {
    resolver: ModelResolver,
    tokens: SharedTokenProvider,
    regional: RegionalClientCache,
    images: SyncPredictClient,
    videos: LongRunningOperationPoller,
}

impl GenerationDispatcher {
    pub fn new(config: GatewayConfig, tokens: SharedTokenProvider) -> Self {
        let config = Arc::new(config);
        let http = reqwest::Client::new();
        let backend = Arc::new(VertexOperationBackend::new(config.clone(), http.clone()));
        Self {
            resolver: ModelResolver::new(),
            tokens,
            regional: RegionalClientCache::new(config.clone(), http.clone()),
            images: SyncPredictClient::new(config, http),
            videos: LongRunningOperationPoller::new(backend),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ModelResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.videos = self.videos.with_policy(policy);
        self
    }

    /// Swap the video job backend, keeping the current poll policy.
    #[must_use]
    pub fn with_operation_backend(mut self, backend: Arc<dyn OperationBackend>) -> Self {
        let policy = self.videos.policy().clone();
        self.videos = LongRunningOperationPoller::new(backend).with_policy(policy);
        self
    }

    pub fn resolver(&self) -> &ModelResolver {
        &self.resolver
    }

    pub fn regional_clients(&self) -> &RegionalClientCache {
        &self.regional
    }

    /// Resolve the model and run the request on its backend.
    pub async fn dispatch(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        if request.model.trim().is_empty() {
            return Err(GatewayError::invalid_request("model is required"));
        }
        let descriptor = self.resolver.resolve(&request.model);

        match descriptor.family() {
            ModelFamily::Image => {
                let prompt = request.require_prompt()?;
                let token = self.tokens.access_token().await?;
                let response = self.images.generate_image(&token, &descriptor, prompt).await?;
                Ok(GenerationOutput::Normalized(response))
            }
            ModelFamily::Video => {
                let mut video = VideoRequest::new(request.require_prompt()?);
                if let Some(image) = request.image.as_deref().filter(|i| !i.is_empty()) {
                    video = video.with_image(ReferenceImage::from_client(image));
                }
                let token = self.tokens.access_token().await?;
                let response = self.videos.generate_video(&token, &descriptor, &video).await?;
                Ok(GenerationOutput::Normalized(response))
            }
            ModelFamily::Chat => {
                let body = request.chat_body()?;
                let descriptor = self.chat_descriptor(descriptor, request.location.as_deref());
                let client = self.regional.get(&descriptor.region)?;
                let token = self.tokens.access_token().await?;
                let response = client.generate_content(&token, &descriptor.resolved_id, &body).await?;
                Ok(GenerationOutput::Raw(response))
            }
        }
    }

    fn chat_descriptor(&self, descriptor: ModelDescriptor, location: Option<&str>) -> ModelDescriptor {
        match location.filter(|l| !l.is_empty()) {
            Some(location) if location != descriptor.region => {
                tracing::debug!(model = %descriptor.resolved_id, region = %location, "Region overridden by request");
                descriptor.in_region(location)
            }
            _ => descriptor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::StaticTokenProvider;

    fn dispatcher(config: GatewayConfig) -> GenerationDispatcher {
        GenerationDispatcher::new(config, Arc::new(StaticTokenProvider::new("token")))
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "model": "gemini-3-pro",
            "prompt": "hi",
            "systemInstruction": {"parts": [{"text": "be brief"}]},
            "tools": [{"googleSearch": {}}],
            "location": "europe-west4"
        }))
        .unwrap();
        assert_eq!(request.model, "gemini-3-pro");
        assert_eq!(request.location.as_deref(), Some("europe-west4"));
        assert!(request.system_instruction.is_some());
        assert_eq!(request.tools.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_chat_body_synthesizes_user_turn() {
        let body = GenerationRequest::new("gemini-3-flash").with_prompt("hello").chat_body().unwrap();
        assert_eq!(body, json!({"contents": [{"role": "user", "parts": [{"text": "hello"}]}]}));
    }

    #[test]
    fn test_chat_body_prefers_contents_and_attaches_optionals() {
        let mut request = GenerationRequest::new("gemini-3-flash").with_prompt("ignored");
        request.contents = Some(vec![json!({"role": "user", "parts": [{"text": "from contents"}]})]);
        request.system_instruction = Some(json!({"parts": [{"text": "sys"}]}));
        request.tools = Some(vec![json!({"googleSearch": {}})]);

        let body = request.chat_body().unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "from contents");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["tools"], json!([{"googleSearch": {}}]));
    }

    #[test]
    fn test_chat_body_requires_input() {
        let err = GenerationRequest::new("gemini-3-flash").chat_body().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_project_surfaces_config_error() {
        let dispatcher = dispatcher(GatewayConfig::new());
        let err = dispatcher
            .dispatch(&GenerationRequest::new("gemini-3-pro").with_prompt("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
        assert!(dispatcher.regional_clients().is_empty());
    }

    #[tokio::test]
    async fn test_media_models_require_prompt() {
        let dispatcher = dispatcher(GatewayConfig::new().with_project_id("p"));
        for model in ["imagen-4", "veo-3"] {
            let err = dispatcher.dispatch(&GenerationRequest::new(model)).await.unwrap_err();
            assert!(matches!(err, GatewayError::InvalidRequest(_)), "{model}");
        }
    }

    #[tokio::test]
    async fn test_empty_model_rejected() {
        let dispatcher = dispatcher(GatewayConfig::new().with_project_id("p"));
        let err = dispatcher.dispatch(&GenerationRequest::new(" ")).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[test]
    fn test_location_overrides_chat_region() {
        let dispatcher = dispatcher(GatewayConfig::new());
        let descriptor = dispatcher.resolver().resolve("gemini-3-pro");
        let pinned = dispatcher.chat_descriptor(descriptor.clone(), Some("europe-west4"));
        assert_eq!(pinned.region, "europe-west4");
        assert_eq!(pinned.resolved_id, descriptor.resolved_id);
        assert_eq!(dispatcher.chat_descriptor(descriptor.clone(), Some("")), descriptor);
    }
}
