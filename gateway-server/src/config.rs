use gateway_live::LiveRelay;
use gateway_vertex::GenerationDispatcher;
use std::{sync::Arc, time::Duration};

/// Default request timeout. Video jobs poll for up to roughly 26 minutes.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default maximum request body size, sized for inline reference images.
pub const DEFAULT_MAX_BODY_SIZE: usize = 20 * 1024 * 1024;

/// Security configuration for the gateway server.
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    /// Allowed origins for CORS (empty = allow all)
    pub allowed_origins: Vec<String>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Longest a generation request may take before answering `500`
    pub request_timeout: Duration,
    /// Whether error responses carry the underlying error text in `details`
    pub expose_error_details: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            expose_error_details: false,
        }
    }
}

impl SecurityConfig {
    /// Permissive CORS, detailed errors
    pub fn development() -> Self {
        Self { expose_error_details: true, ..Self::default() }
    }

    /// Restricted CORS origins, generic error details
    pub fn production(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins, ..Self::default() }
    }
}

/// Everything the router needs.
#[derive(Clone)]
pub struct ServerConfig {
    pub dispatcher: Arc<GenerationDispatcher>,
    pub relay: LiveRelay,
    pub security: SecurityConfig,
}

impl ServerConfig {
    pub fn new(dispatcher: GenerationDispatcher, relay: LiveRelay) -> Self {
        Self { dispatcher: Arc::new(dispatcher), relay, security: SecurityConfig::default() }
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    /// Configure allowed CORS origins
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.security.allowed_origins = origins;
        self
    }

    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.security.max_body_size = size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.security.request_timeout = timeout;
        self
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.security.expose_error_details = expose;
        self
    }
}
