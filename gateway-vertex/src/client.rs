//! Per-region chat clients and their process-lifetime cache.

use crate::http::{model_method_url, post_json};
use gateway_core::{GatewayConfig, ModelDescriptor, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// `generateContent` client bound to one region's endpoint.
#[derive(Debug)]
pub struct RegionalClient {
    region: String,
    api_base: String,
    project_id: String,
    http: reqwest::Client,
}

impl RegionalClient {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Send a chat body to `model_id` and return the upstream JSON untouched.
    pub async fn generate_content(&self, token: &str, model_id: &str, body: &Value) -> Result<Value> {
        let descriptor = ModelDescriptor {
            requested_id: model_id.to_string(),
            resolved_id: model_id.to_string(),
            region: self.region.clone(),
        };
        let url = model_method_url(&self.api_base, &descriptor, &self.project_id, "generateContent");
        tracing::debug!(model = %model_id, region = %self.region, "generateContent");
        post_json(&self.http, &url, token, body).await
    }
}

/// Lazily built, never rebuilt, [`RegionalClient`] per region.
#[derive(Debug)]
pub struct RegionalClientCache {
    config: Arc<GatewayConfig>,
    http: reqwest::Client,
    clients: RwLock<HashMap<String, Arc<RegionalClient>>>,
}

impl RegionalClientCache {
    pub fn new(config: Arc<GatewayConfig>, http: reqwest::Client) -> Self {
        Self { config, http, clients: RwLock::new(HashMap::new()) }
    }

    /// Client for `region`, building it on first use.
    ///
    /// Fails with a configuration error when no project id is set; nothing is
    /// cached in that case.
    pub fn get(&self, region: &str) -> Result<Arc<RegionalClient>> {
        if let Some(client) = self.clients.read().get(region) {
            return Ok(client.clone());
        }

        let project_id = self.config.require_project()?.to_string();
        let mut clients = self.clients.write();
        let client = clients.entry(region.to_string()).or_insert_with(|| {
            tracing::info!(region, "Creating regional client");
            Arc::new(RegionalClient {
                region: region.to_string(),
                api_base: self.config.api_base(region),
                project_id,
                http: self.http.clone(),
            })
        });
        Ok(client.clone())
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}
