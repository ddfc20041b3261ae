use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The shape of output requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Free-form text.
    #[default]
    Text,
    /// A single JSON document. Providers translate this into their own
    /// switch (`responseMimeType` for Gemini, `response_format` for OpenRouter).
    Json,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub response_format: ResponseFormat,
}

impl AiConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            response_format: ResponseFormat::Text,
        }
    }

    /// Same settings, but asking for a JSON document back.
    pub fn as_json(&self) -> Self {
        Self {
            response_format: ResponseFormat::Json,
            ..self.clone()
        }
    }
}

/// Response from an AI provider, containing the main content and optional thinking.
///
/// Gemini 2.5+ models may return their reasoning as separate parts; we keep it
/// apart from the answer so it never ends up in a forum reply.
#[derive(Debug, Clone, Default)]
pub struct AiProviderResponse {
    /// The main response content from the model.
    pub content: String,

    /// Optional thinking/reasoning process from the model.
    pub thinking: Option<String>,
}
