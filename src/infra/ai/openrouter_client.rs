use crate::core::ai::{AiConfig, AiMessage, AiProvider, AiProviderResponse, ResponseFormat};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::error::Error;

const CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    fn build_payload(messages: &[AiMessage], config: &AiConfig) -> serde_json::Value {
        let mut payload = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
        });

        if config.response_format == ResponseFormat::Json {
            payload["response_format"] = json!({ "type": "json_object" });
        }
        payload
    }

    fn parse_response(
        response_json: &serde_json::Value,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let message = &response_json["choices"][0]["message"];

        let content = message["content"]
            .as_str()
            .ok_or("Failed to parse response content")?
            .to_string();

        // Reasoning models report their chain of thought next to the answer.
        let thinking = message["reasoning"]
            .as_str()
            .filter(|r| !r.trim().is_empty())
            .map(str::to_string);

        Ok(AiProviderResponse { content, thinking })
    }
}

#[async_trait]
impl AiProvider for OpenRouterClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let payload = Self::build_payload(messages, config);

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(format!("OpenRouter API error: {} - {}", status, text).into());
        }

        let response_json: serde_json::Value = response.json().await?;
        Self::parse_response(&response_json)
    }
}
