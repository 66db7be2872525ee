//! Response envelope shared by every generation path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Candidate list with a single text part, mirroring the chat response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateContent {
    pub role: String,
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

impl NormalizedResponse {
    /// Wrap a single text part as one model candidate.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: CandidateContent {
                    role: "model".to_string(),
                    parts: vec![TextPart { text: text.into() }],
                },
            }],
        }
    }

    /// Text of the first part of the first candidate.
    pub fn text(&self) -> Option<&str> {
        self.candidates.first()?.content.parts.first().map(|p| p.text.as_str())
    }
}

/// What the dispatcher hands back to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenerationOutput {
    /// Image/video output wrapped into the candidate envelope.
    Normalized(NormalizedResponse),
    /// Chat backend response, passed through untouched.
    Raw(Value),
}
