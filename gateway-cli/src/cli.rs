use clap::{Parser, Subcommand, ValueEnum};
use gateway_telemetry::LogFormat;

#[derive(Parser)]
#[command(name = "gateway")]
#[command(about = "Generative-AI gateway for chat, image, video and live audio", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP/WebSocket server
    Serve(ServeArgs),

    /// Show how a model id is resolved
    Resolve {
        /// Client-facing model id
        model: String,
    },
}

/// Where upstream bearer tokens come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    /// A fixed token from `--access-token` / `GOOGLE_ACCESS_TOKEN`
    Static,
    /// Application Default Credentials (requires the `adc` feature)
    Adc,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Server port
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Cloud project id
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project: Option<String>,

    /// Replace every regional API base (private endpoints, testing)
    #[arg(long, env = "GATEWAY_API_BASE")]
    pub api_base: Option<String>,

    /// Model used for live sessions
    #[arg(long, env = "GATEWAY_LIVE_MODEL")]
    pub live_model: Option<String>,

    /// Pin live sessions to a region
    #[arg(long, env = "GATEWAY_LIVE_REGION")]
    pub live_region: Option<String>,

    /// Replace the live websocket URL
    #[arg(long, env = "GATEWAY_LIVE_URL")]
    pub live_url: Option<String>,

    /// Default voice for live sessions
    #[arg(long)]
    pub voice: Option<String>,

    /// Token source
    #[arg(long, value_enum, default_value_t = AuthMode::Static)]
    pub auth: AuthMode,

    /// Static bearer token
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Allowed CORS origin; repeat for several. None allows any origin.
    #[arg(long = "allowed-origin")]
    pub allowed_origins: Vec<String>,

    /// Log output format: text or json
    #[arg(long, env = "GATEWAY_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}
