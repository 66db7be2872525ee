//! # gateway-core
//!
//! Shared building blocks for the generative-AI gateway.
//!
//! - [`ModelResolver`] maps client model ids onto backend ids and regions
//! - [`TokenProvider`] is the seam to the external credential source
//! - [`GatewayConfig`] carries project and live-session settings
//! - [`GatewayError`] is the error type shared by every gateway crate

pub mod config;
pub mod credentials;
pub mod error;
pub mod model;

pub use config::GatewayConfig;
#[cfg(feature = "adc")]
pub use credentials::AdcTokenProvider;
pub use credentials::{SharedTokenProvider, StaticTokenProvider, TokenProvider};
pub use error::{GatewayError, Result};
pub use model::{
    GLOBAL_REGION, MEDIA_REGION, ModelAlias, ModelDescriptor, ModelFamily, ModelResolver,
    regional_host,
};
