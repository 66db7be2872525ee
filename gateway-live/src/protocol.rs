//! Control messages exchanged with the client and the upstream setup message.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Tool entries that switch on native search grounding.
pub const SEARCH_GROUNDING_MARKERS: &[&str] = &["google_search", "googleSearch"];

/// Output modality requested from upstream.
const RESPONSE_MODALITY: &str = "AUDIO";

/// Session preferences sent once by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
}

impl ClientConfig {
    /// True when any declared tool is the search-grounding marker.
    ///
    /// A marker may appear as a bare string, as an object key
    /// (`{"google_search": {}}`), or as an object's `name`.
    pub fn wants_search_grounding(&self) -> bool {
        self.tools.iter().any(|tool| match tool {
            Value::String(name) => is_marker(name),
            Value::Object(map) => {
                map.keys().any(|k| is_marker(k))
                    || map.get("name").and_then(Value::as_str).is_some_and(is_marker)
            }
            _ => false,
        })
    }
}

fn is_marker(name: &str) -> bool {
    SEARCH_GROUNDING_MARKERS.contains(&name)
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Client control messages understood before streaming starts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientControl {
    Config {
        #[serde(default, deserialize_with = "null_as_default")]
        config: ClientConfig,
    },
}

impl ClientControl {
    /// Parse a client text frame; anything else is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Messages the gateway itself sends to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerNotice {
    SetupComplete,
    Error { error: String },
}

impl ServerNotice {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { error: message.into() }
    }

    pub fn to_json(&self) -> String {
        // Unit and string-only variants always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// First message on the upstream channel.
#[derive(Debug, Clone, Serialize)]
pub struct SetupMessage {
    pub setup: Setup,
}

#[derive(Debug, Clone, Serialize)]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    pub system_instruction: Content,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextPart {
    pub text: String,
}

impl SetupMessage {
    /// Build the setup for `model_path`, falling back to the given defaults
    /// for anything the client left out.
    pub fn new(model_path: &str, config: &ClientConfig, default_voice: &str, default_instruction: &str) -> Self {
        let voice = config.voice.as_deref().filter(|v| !v.is_empty()).unwrap_or(default_voice);
        let instruction =
            config.system_instruction.as_deref().filter(|i| !i.is_empty()).unwrap_or(default_instruction);
        let tools = if config.wants_search_grounding() {
            vec![serde_json::json!({ "google_search": {} })]
        } else {
            Vec::new()
        };

        Self {
            setup: Setup {
                model: model_path.to_string(),
                generation_config: GenerationConfig {
                    response_modalities: vec![RESPONSE_MODALITY.to_string()],
                    speech_config: SpeechConfig {
                        voice_config: VoiceConfig {
                            prebuilt_voice_config: PrebuiltVoiceConfig { voice_name: voice.to_string() },
                        },
                    },
                },
                system_instruction: Content { parts: vec![TextPart { text: instruction.to_string() }] },
                tools,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PATH: &str = "projects/p/locations/us-central1/publishers/google/models/m";

    #[test]
    fn test_parse_config_message() {
        let control = ClientControl::parse(
            r#"{"type":"config","config":{"voice":"Kore","systemInstruction":"Be short","tools":["google_search"]}}"#,
        )
        .unwrap();
        let ClientControl::Config { config } = control;
        assert_eq!(config.voice.as_deref(), Some("Kore"));
        assert_eq!(config.system_instruction.as_deref(), Some("Be short"));
        assert!(config.wants_search_grounding());
    }

    #[test]
    fn test_parse_config_without_body() {
        assert_eq!(
            ClientControl::parse(r#"{"type":"config"}"#),
            Some(ClientControl::Config { config: ClientConfig::default() })
        );
    }

    #[test]
    fn test_parse_config_with_null_fields() {
        let control = ClientControl::parse(
            r#"{"type":"config","config":{"voice":null,"systemInstruction":null,"tools":null}}"#,
        )
        .unwrap();
        assert_eq!(control, ClientControl::Config { config: ClientConfig::default() });
        assert_eq!(
            ClientControl::parse(r#"{"type":"config","config":null}"#),
            Some(ClientControl::Config { config: ClientConfig::default() })
        );
    }

    #[test]
    fn test_parse_rejects_other_messages() {
        assert_eq!(ClientControl::parse(r#"{"realtime_input":{}}"#), None);
        assert_eq!(ClientControl::parse(r#"{"type":"ping"}"#), None);
        assert_eq!(ClientControl::parse("garbage"), None);
    }

    #[test]
    fn test_grounding_marker_forms() {
        let with = |tools: Value| ClientConfig { tools: serde_json::from_value(tools).unwrap(), ..Default::default() };
        assert!(with(json!([{"google_search": {}}])).wants_search_grounding());
        assert!(with(json!([{"googleSearch": {}}])).wants_search_grounding());
        assert!(with(json!([{"name": "google_search", "description": "web"}])).wants_search_grounding());
        assert!(!with(json!([{"name": "get_weather"}])).wants_search_grounding());
        assert!(!with(json!([])).wants_search_grounding());
    }

    #[test]
    fn test_notices() {
        assert_eq!(ServerNotice::SetupComplete.to_json(), r#"{"type":"setup_complete"}"#);
        let value: Value = serde_json::from_str(&ServerNotice::error("bad \"token\"").to_json()).unwrap();
        assert_eq!(value, json!({"type": "error", "error": "bad \"token\""}));
        assert_eq!(serde_json::to_value(ServerNotice::SetupComplete).unwrap(), json!({"type": "setup_complete"}));
    }

    #[test]
    fn test_setup_defaults() {
        let setup = serde_json::to_value(SetupMessage::new(PATH, &ClientConfig::default(), "Puck", "Help.")).unwrap();
        assert_eq!(
            setup,
            json!({
                "setup": {
                    "model": PATH,
                    "generation_config": {
                        "response_modalities": ["AUDIO"],
                        "speech_config": {"voice_config": {"prebuilt_voice_config": {"voice_name": "Puck"}}}
                    },
                    "system_instruction": {"parts": [{"text": "Help."}]}
                }
            })
        );
    }

    #[test]
    fn test_setup_uses_client_choices_and_grounding() {
        let config = ClientConfig {
            voice: Some("Charon".to_string()),
            system_instruction: Some("Talk like a pirate".to_string()),
            tools: vec![json!("google_search"), json!({"name": "other"})],
        };
        let setup = serde_json::to_value(SetupMessage::new(PATH, &config, "Puck", "Help.")).unwrap();
        let voice = &setup["setup"]["generation_config"]["speech_config"]["voice_config"]["prebuilt_voice_config"];
        assert_eq!(voice["voice_name"], "Charon");
        assert_eq!(setup["setup"]["system_instruction"]["parts"][0]["text"], "Talk like a pirate");
        assert_eq!(setup["setup"]["tools"], json!([{"google_search": {}}]));
    }
}
