use crate::cli::{AuthMode, ServeArgs};
use anyhow::Result;
use gateway_core::{GatewayConfig, SharedTokenProvider, StaticTokenProvider};
use gateway_live::{LiveRelay, WebSocketConnector};
use gateway_server::{SecurityConfig, ServerConfig, create_app};
use gateway_vertex::GenerationDispatcher;
use std::sync::Arc;

pub fn gateway_config(args: &ServeArgs) -> GatewayConfig {
    let mut config = GatewayConfig::new();
    config.project_id = args.project.clone();
    config.api_base_override = args.api_base.clone();
    config.live_region = args.live_region.clone();
    config.live_url_override = args.live_url.clone();
    if let Some(model) = &args.live_model {
        config.live_model = model.clone();
    }
    if let Some(voice) = &args.voice {
        config.default_voice = voice.clone();
    }
    config
}

fn token_provider(args: &ServeArgs) -> Result<SharedTokenProvider> {
    match args.auth {
        AuthMode::Static => {
            let token = args.access_token.clone().unwrap_or_default();
            if token.is_empty() {
                tracing::warn!("No access token configured; upstream calls will fail authentication");
            }
            Ok(Arc::new(StaticTokenProvider::new(token)))
        }
        #[cfg(feature = "adc")]
        AuthMode::Adc => Ok(Arc::new(gateway_core::AdcTokenProvider::new()?)),
        #[cfg(not(feature = "adc"))]
        AuthMode::Adc => anyhow::bail!("built without the `adc` feature; use --auth static"),
    }
}

fn security_config(args: &ServeArgs) -> SecurityConfig {
    if args.allowed_origins.is_empty() {
        SecurityConfig::development()
    } else {
        SecurityConfig::production(args.allowed_origins.clone())
    }
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    if let Err(e) = gateway_telemetry::init_with_format("gateway", args.log_format) {
        eprintln!("Failed to initialize telemetry: {e}");
    }

    let gateway = gateway_config(&args);
    if gateway.project_id.is_none() {
        tracing::warn!("GOOGLE_CLOUD_PROJECT is not set; requests will fail until it is configured");
    }
    let tokens = token_provider(&args)?;

    let config = ServerConfig::new(
        GenerationDispatcher::new(gateway.clone(), tokens.clone()),
        LiveRelay::new(gateway, tokens, Arc::new(WebSocketConnector::new())),
    )
    .with_security(security_config(&args));

    let app = create_app(config);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "Gateway listening");
    println!("Gateway starting on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
