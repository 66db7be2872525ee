//! Model identifier resolution.
//!
//! Upstream partitions models by region non-uniformly, and new ids show up
//! before the alias table learns about them. Resolution therefore falls back
//! in three tiers: exact alias, media-family prefix, global default.

use serde::{Deserialize, Serialize};

/// Region serving the general chat/multimodal models.
pub const GLOBAL_REGION: &str = "global";

/// Region serving image and video generation models.
pub const MEDIA_REGION: &str = "us-central1";

/// Prefixes of model families that are only served from [`MEDIA_REGION`].
const MEDIA_PREFIXES: &[&str] = &["imagen", "veo"];

/// A static alias entry: requested id, backend id, pinned region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelAlias {
    pub requested: &'static str,
    pub resolved: &'static str,
    pub region: &'static str,
}

const DEFAULT_ALIASES: &[ModelAlias] = &[
    ModelAlias {
        requested: "gemini-3-pro",
        resolved: "gemini-3-pro-preview",
        region: GLOBAL_REGION,
    },
    ModelAlias {
        requested: "gemini-3-flash",
        resolved: "gemini-3-flash-preview",
        region: GLOBAL_REGION,
    },
    ModelAlias {
        requested: "gemini-2.5-flash-image",
        resolved: "gemini-2.5-flash-image",
        region: GLOBAL_REGION,
    },
    ModelAlias { requested: "imagen-4", resolved: "imagen-4.0-generate-001", region: MEDIA_REGION },
    ModelAlias {
        requested: "imagen-4-fast",
        resolved: "imagen-4.0-fast-generate-001",
        region: MEDIA_REGION,
    },
    ModelAlias { requested: "veo-3", resolved: "veo-3.0-generate-001", region: MEDIA_REGION },
    ModelAlias {
        requested: "veo-3-fast",
        resolved: "veo-3.0-fast-generate-001",
        region: MEDIA_REGION,
    },
    ModelAlias {
        requested: "gemini-live",
        resolved: "gemini-live-2.5-flash-native-audio",
        region: MEDIA_REGION,
    },
];

/// Backend family a resolved model belongs to. Decides the dispatch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Synchronous image `predict`.
    Image,
    /// Long-running video `predictLongRunning`.
    Video,
    /// Chat / multimodal `generateContent`.
    Chat,
}

/// The outcome of resolving a client-supplied model id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub requested_id: String,
    pub resolved_id: String,
    pub region: String,
}

impl ModelDescriptor {
    /// Family of the resolved id.
    pub fn family(&self) -> ModelFamily {
        if self.resolved_id.starts_with("imagen") {
            ModelFamily::Image
        } else if self.resolved_id.starts_with("veo") {
            ModelFamily::Video
        } else {
            ModelFamily::Chat
        }
    }

    /// Returns a copy pinned to another region, keeping the resolved id.
    pub fn in_region(&self, region: impl Into<String>) -> Self {
        Self { region: region.into(), ..self.clone() }
    }

    /// Fully qualified publisher model resource path.
    pub fn resource_path(&self, project_id: &str) -> String {
        format!(
            "projects/{project_id}/locations/{}/publishers/google/models/{}",
            self.region, self.resolved_id
        )
    }
}

/// Host serving the platform API for a region.
pub fn regional_host(region: &str) -> String {
    if region == GLOBAL_REGION {
        "aiplatform.googleapis.com".to_string()
    } else {
        format!("{region}-aiplatform.googleapis.com")
    }
}

/// Maps client model ids onto backend ids and service regions.
#[derive(Debug, Clone)]
pub struct ModelResolver {
    aliases: Vec<ModelAlias>,
}

impl Default for ModelResolver {
    fn default() -> Self {
        Self { aliases: DEFAULT_ALIASES.to_vec() }
    }
}

impl ModelResolver {
    /// Resolver backed by the built-in alias table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an alias entry.
    pub fn with_alias(mut self, alias: ModelAlias) -> Self {
        self.aliases.retain(|a| a.requested != alias.requested);
        self.aliases.push(alias);
        self
    }

    /// Alias entries currently known to the resolver.
    pub fn aliases(&self) -> &[ModelAlias] {
        &self.aliases
    }

    /// Resolve a requested id. Never fails.
    pub fn resolve(&self, requested_id: &str) -> ModelDescriptor {
        if let Some(alias) = self.aliases.iter().find(|a| a.requested == requested_id) {
            return ModelDescriptor {
                requested_id: requested_id.to_string(),
                resolved_id: alias.resolved.to_string(),
                region: alias.region.to_string(),
            };
        }

        let region = if MEDIA_PREFIXES.iter().any(|p| requested_id.starts_with(p)) {
            MEDIA_REGION
        } else {
            GLOBAL_REGION
        };

        tracing::debug!(model = %requested_id, region, "No alias for model; using region fallback");

        ModelDescriptor {
            requested_id: requested_id.to_string(),
            resolved_id: requested_id.to_string(),
            region: region.to_string(),
        }
    }
}
