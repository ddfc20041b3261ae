// =============================================================================
// GEMINI CLIENT - Google AI Studio API Integration
// =============================================================================
//
// Implements `AiProvider` over the Gemini `generateContent` endpoint.
//
// - Authentication: API key goes in the `x-goog-api-key` header, never the URL,
//   so transport errors (which quote the URL) cannot leak it.
// - A system message becomes the top-level `systemInstruction`.
// - JSON mode maps to `generationConfig.responseMimeType = "application/json"`.
//
// **Environment Variables:**
// - `GEMINI_API_KEY` - API key from https://aistudio.google.com/apikey
// - `GEMINI_MODEL` - defaults to `gemini-2.5-flash`

use crate::core::ai::{AiConfig, AiMessage, AiProvider, AiProviderResponse, ResponseFormat};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

impl GenerationConfig {
    fn from_config(config: &AiConfig) -> Self {
        let response_mime_type = match config.response_format {
            ResponseFormat::Json => Some("application/json".to_string()),
            ResponseFormat::Text => None,
        };

        Self {
            temperature: Some(config.temperature),
            max_output_tokens: config.max_tokens,
            response_mime_type,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,

    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,

    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    fn text_part(text: &str) -> Part {
        Part {
            text: Some(text.to_string()),
        }
    }

    fn convert_message(msg: &AiMessage) -> Content {
        let role = match msg.role.as_str() {
            "assistant" => "model".to_string(),
            other => other.to_string(),
        };

        Content {
            role,
            parts: vec![Self::text_part(&msg.content)],
        }
    }

    fn endpoint(model: &str) -> String {
        format!("{}/{}:generateContent", API_BASE, model)
    }

    fn http_request(&self, model: &str, body: &GenerateContentRequest) -> reqwest::RequestBuilder {
        self.client
            .post(Self::endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
    }

    fn build_request(messages: &[AiMessage], config: &AiConfig) -> GenerateContentRequest {
        let system_instruction = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| Content {
                role: "user".to_string(),
                parts: vec![Self::text_part(&m.content)],
            });

        let contents = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(Self::convert_message)
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig::from_config(config),
        }
    }

    /// Splits the candidate's text parts into (answer, thinking).
    /// Thinking models put their reasoning in every part before the last.
    fn split_parts(parts: &[Part]) -> (String, Option<String>) {
        let texts: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();

        let Some((answer, before)) = texts.split_last() else {
            return (String::new(), None);
        };

        let thinking = if before.is_empty() {
            None
        } else {
            Some(before.join("\n\n"))
        };
        (answer.to_string(), thinking)
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let request = Self::build_request(messages, config);

        tracing::debug!(
            "Gemini request to model {}: {} messages, format {:?}",
            config.model,
            messages.len(),
            config.response_format
        );

        let response = self
            .http_request(&config.model, &request)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.map_err(|e| e.without_url())?;

            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&error_text) {
                return Err(format!(
                    "Gemini API error ({}): {}",
                    status, error_response.error.message
                )
                .into());
            }

            return Err(format!("Gemini API error: {} - {}", status, error_text).into());
        }

        let response_json: GenerateContentResponse =
            response.json().await.map_err(|e| e.without_url())?;

        let candidate = response_json
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .ok_or(
                "No content in Gemini response - the model may have been blocked by safety filters",
            )?;

        let (content, thinking) = Self::split_parts(&candidate.content.parts);

        tracing::debug!(
            "Gemini response received: {} chars content, {} chars thinking, finish reason {:?}",
            content.len(),
            thinking.as_ref().map(|t| t.len()).unwrap_or(0),
            candidate.finish_reason
        );

        Ok(AiProviderResponse { content, thinking })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_stays_out_of_the_url() {
        let client = GeminiClient::new("SECRET123".to_string());
        let body = GeminiClient::build_request(&[AiMessage::user("hi")], &AiConfig::new("m"));

        let request = client.http_request("m", &body).build().unwrap();

        assert!(!request.url().as_str().contains("SECRET123"));
        assert_eq!(request.url().query(), None);
        assert!(request.url().path().ends_with("/models/m:generateContent"));
        assert_eq!(request.headers()["x-goog-api-key"], "SECRET123");
    }

    #[tokio::test]
    async fn test_transport_error_does_not_mention_key() {
        let mut client = GeminiClient::new("SECRET123".to_string());
        client.client = Client::builder()
            .proxy(reqwest::Proxy::all("http://127.0.0.1:1").unwrap())
            .build()
            .unwrap();

        let error = client
            .chat_complete(&[AiMessage::user("hi")], &AiConfig::new("m"))
            .await
            .unwrap_err();

        assert!(!error.to_string().contains("SECRET123"));
    }

    #[test]
    fn test_convert_message_assistant_to_model() {
        let msg = AiMessage {
            role: "assistant".to_string(),
            content: "Hi there!".to_string(),
        };

        let content = GeminiClient::convert_message(&msg);

        assert_eq!(content.role, "model");
        assert_eq!(content.parts[0].text, Some("Hi there!".to_string()));
    }

    #[test]
    fn test_system_message_becomes_system_instruction() {
        let messages = vec![AiMessage::system("be kind"), AiMessage::user("hello")];

        let request = GeminiClient::build_request(&messages, &AiConfig::new("gemini-2.5-flash"));

        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role, "user");
        let system = request.system_instruction.expect("system instruction");
        assert_eq!(system.parts[0].text.as_deref(), Some("be kind"));
    }

    #[test]
    fn test_json_mode_sets_mime_type() {
        let config = AiConfig::new("gemini-2.5-flash").as_json();

        let json = serde_json::to_string(&GenerationConfig::from_config(&config)).unwrap();

        assert!(json.contains("\"responseMimeType\":\"application/json\""));
        assert!(json.contains("\"temperature\""));
        assert!(!json.contains("maxOutputTokens"));
    }

    #[test]
    fn test_text_mode_omits_mime_type() {
        let json =
            serde_json::to_string(&GenerationConfig::from_config(&AiConfig::new("m"))).unwrap();
        assert!(!json.contains("responseMimeType"));
    }

    #[test]
    fn test_split_parts_separates_thinking() {
        let parts = vec![
            GeminiClient::text_part("considering"),
            GeminiClient::text_part("{\"flagged\": false}"),
        ];

        let (answer, thinking) = GeminiClient::split_parts(&parts);

        assert_eq!(answer, "{\"flagged\": false}");
        assert_eq!(thinking.as_deref(), Some("considering"));
    }

    #[test]
    fn test_response_parsing_tolerates_missing_parts() {
        let raw = r#"{"candidates": [{"content": {"role": "model"}, "finishReason": "SAFETY"}]}"#;

        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let candidate = &parsed.candidates.unwrap()[0];

        assert_eq!(GeminiClient::split_parts(&candidate.content.parts), (String::new(), None));
        assert_eq!(candidate.finish_reason.as_deref(), Some("SAFETY"));
    }
}
