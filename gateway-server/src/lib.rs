//! # gateway-server
//!
//! axum router exposing the gateway to clients:
//!
//! | route | handler |
//! |---|---|
//! | `GET /api/health` | liveness, returns `OK` |
//! | `POST /api/generate` | [`gateway_vertex::GenerationDispatcher`] |
//! | `GET /api/live` | websocket upgrade into a [`gateway_live::LiveRelaySession`] |
//!
//! Failed generation requests answer `500` with `{"error", "details"}`.

pub mod config;
pub mod error;
pub mod rest;

pub use config::{SecurityConfig, ServerConfig};
pub use error::{ApiError, ErrorBody};
pub use rest::create_app;
