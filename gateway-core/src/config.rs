//! Gateway configuration.

use crate::error::{GatewayError, Result};
use crate::model::regional_host;

/// Voice used by live sessions when the client does not pick one.
pub const DEFAULT_VOICE: &str = "Puck";

/// System instruction used by live sessions when the client sends none.
pub const DEFAULT_INSTRUCTION: &str = "You are a helpful assistant.";

/// Requested model id for live sessions, resolved through the alias table.
pub const DEFAULT_LIVE_MODEL: &str = "gemini-live";

/// Configuration consumed by the dispatcher and the live relay.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Cloud project id. Validated lazily, on first use.
    pub project_id: Option<String>,
    /// Replaces every regional `https://…` API base (testing, private endpoints).
    pub api_base_override: Option<String>,
    /// Requested model id for live sessions.
    pub live_model: String,
    /// Pins the live region instead of the resolved one.
    pub live_region: Option<String>,
    /// Replaces the live websocket URL.
    pub live_url_override: Option<String>,
    pub default_voice: String,
    pub default_instruction: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            api_base_override: None,
            live_model: DEFAULT_LIVE_MODEL.to_string(),
            live_region: None,
            live_url_override: None,
            default_voice: DEFAULT_VOICE.to_string(),
            default_instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from environment variables.
    ///
    /// | variable | field |
    /// |---|---|
    /// | `GOOGLE_CLOUD_PROJECT` | `project_id` |
    /// | `GATEWAY_API_BASE` | `api_base_override` |
    /// | `GATEWAY_LIVE_MODEL` | `live_model` |
    /// | `GATEWAY_LIVE_REGION` | `live_region` |
    /// | `GATEWAY_LIVE_URL` | `live_url_override` |
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let mut config = Self::default();
        config.project_id = var("GOOGLE_CLOUD_PROJECT");
        config.api_base_override = var("GATEWAY_API_BASE");
        if let Some(model) = var("GATEWAY_LIVE_MODEL") {
            config.live_model = model;
        }
        config.live_region = var("GATEWAY_LIVE_REGION");
        config.live_url_override = var("GATEWAY_LIVE_URL");
        config
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base_override = Some(base.into());
        self
    }

    pub fn with_live_model(mut self, model: impl Into<String>) -> Self {
        self.live_model = model.into();
        self
    }

    pub fn with_live_region(mut self, region: impl Into<String>) -> Self {
        self.live_region = Some(region.into());
        self
    }

    pub fn with_live_url(mut self, url: impl Into<String>) -> Self {
        self.live_url_override = Some(url.into());
        self
    }

    pub fn with_default_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }

    pub fn with_default_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.default_instruction = instruction.into();
        self
    }

    /// The project id, or a configuration error if it was never set.
    pub fn require_project(&self) -> Result<&str> {
        self.project_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| GatewayError::config("GOOGLE_CLOUD_PROJECT is not configured"))
    }

    /// HTTPS API base for a region, without trailing slash.
    pub fn api_base(&self, region: &str) -> String {
        match &self.api_base_override {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}", regional_host(region)),
        }
    }
}
