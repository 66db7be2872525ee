//! Upstream Live API endpoint and websocket connector.

use crate::frame::{Duplex, Frame};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use gateway_core::{GatewayConfig, GatewayError, ModelResolver, Result, regional_host};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;

const LIVE_SERVICE_PATH: &str = "ws/google.cloud.aiplatform.v1beta1.LlmBidiService/BidiGenerateContent";

/// Where a live session connects and which model it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveTarget {
    pub url: String,
    pub region: String,
    /// Full model resource path sent in the setup message.
    pub model_path: String,
}

impl LiveTarget {
    /// Resolve the configured live model. Fails when no project is set.
    pub fn from_config(config: &GatewayConfig, resolver: &ModelResolver) -> Result<Self> {
        let project = config.require_project()?;
        let mut descriptor = resolver.resolve(&config.live_model);
        if let Some(region) = config.live_region.as_deref().filter(|r| !r.is_empty()) {
            descriptor = descriptor.in_region(region);
        }
        let url = config.live_url_override.clone().unwrap_or_else(|| build_live_url(&descriptor.region));
        Ok(Self { url, model_path: descriptor.resource_path(project), region: descriptor.region })
    }
}

/// `wss://{region}-aiplatform.googleapis.com/ws/…/BidiGenerateContent`
pub fn build_live_url(region: &str) -> String {
    format!("wss://{}/{LIVE_SERVICE_PATH}", regional_host(region))
}

/// Opens the upstream duplex channel for a session.
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    async fn connect(&self, target: &LiveTarget, token: &str) -> Result<Duplex>;
}

/// Connector over `tokio-tungstenite` with a bearer `Authorization` header.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UpstreamConnector for WebSocketConnector {
    async fn connect(&self, target: &LiveTarget, token: &str) -> Result<Duplex> {
        let mut request = target
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| GatewayError::connection(format!("Failed to create client request: {e}")))?;
        request.headers_mut().insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| GatewayError::auth(format!("Invalid auth token header: {e}")))?,
        );

        let (ws, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| GatewayError::connection(format!("WebSocket connect error: {e}")))?;
        tracing::info!(region = %target.region, "Upstream live connection open");

        let (sink, stream) = ws.split();
        let sink = sink
            .sink_map_err(|e| GatewayError::connection(format!("Send error: {e}")))
            .with(|frame: Frame| future::ready(Ok::<_, GatewayError>(into_message(frame))));
        let stream = stream.filter_map(|message| future::ready(from_message(message)));
        Ok(Duplex::new(sink, stream))
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(bytes) => Message::Binary(bytes),
    }
}

/// Control frames are handled by tungstenite and never surface.
fn from_message(
    message: std::result::Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<Result<Frame>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
        Ok(Message::Binary(bytes)) => Some(Ok(Frame::Binary(bytes))),
        Ok(Message::Close(frame)) => {
            tracing::debug!(?frame, "Upstream sent close");
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(GatewayError::connection(format!("Receive error: {e}")))),
    }
}
