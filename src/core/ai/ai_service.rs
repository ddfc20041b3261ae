use super::models::{AiConfig, AiMessage, AiProviderResponse};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::error::Error;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    ///
    /// Returns an `AiProviderResponse` containing both the main content
    /// and optional thinking/reasoning from the model.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}

// Lets the composition root pick Gemini or OpenRouter at runtime while the
// services stay generic over `P: AiProvider`.
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        (**self).chat_complete(messages, config).await
    }
}

pub struct AiService<P: AiProvider> {
    provider: P,
    config: AiConfig,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: P, config: AiConfig) -> Self {
        Self { provider, config }
    }

    /// Sends a single prompt, optionally preceded by a system prompt, and
    /// returns the model's answer text.
    pub async fn complete(
        &self,
        system_prompt: Option<&str>,
        prompt: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let messages = Self::build_messages(system_prompt, prompt);
        let response = self.provider.chat_complete(&messages, &self.config).await?;

        if let Some(thinking) = &response.thinking {
            tracing::debug!("Model returned {} chars of thinking", thinking.len());
        }

        Ok(response.content.trim().to_string())
    }

    /// Sends a prompt in JSON mode and deserializes the answer.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> Result<T, Box<dyn Error + Send + Sync>> {
        let messages = Self::build_messages(None, prompt);
        let response = self
            .provider
            .chat_complete(&messages, &self.config.as_json())
            .await?;

        let parsed = serde_json::from_str(Self::extract_json(&response.content))?;
        Ok(parsed)
    }

    fn build_messages(system_prompt: Option<&str>, prompt: &str) -> Vec<AiMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(AiMessage::system(system));
        }
        messages.push(AiMessage::user(prompt));
        messages
    }

    /// Strips a surrounding Markdown code fence, which some models add even in JSON mode.
    fn extract_json(content: &str) -> &str {
        let trimmed = content.trim();
        let Some(rest) = trimmed.strip_prefix("```") else {
            return trimmed;
        };
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.strip_suffix("```").unwrap_or(rest).trim()
    }
}
