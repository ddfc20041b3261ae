// Moderation service - the oracle the forum consults before persisting content.
//
// This service handles:
// - Classification through a hosted language model, in JSON mode
// - The keyword fallback when the model is missing or fails
// - Generating the supportive reply for self-harm disclosures
//
// Failures never reach the caller: every remote error degrades to a local
// substitute and is logged.

use super::keyword_filter::classify_by_keywords;
use super::moderation_models::{ModerationVerdict, KNOWN_CATEGORIES, SELF_HARM};
use crate::core::ai::{AiProvider, AiService};

/// Sent when the model is unavailable or returns nothing usable.
pub const CANNED_SUPPORT_REPLY: &str = "I hear how much pain you're in right now. Please know that you are not alone, and there are people who want to support you. If you're in immediate danger, please reach out to a crisis helpline.";

const SUPPORT_PERSONA: &str = "You are a supportive, empathetic user on an anonymous mental health support forum called safe house. The user might be expressing distress. Provide a short, comforting message.";

pub struct ModerationService<P: AiProvider> {
    /// `None` when no API key is configured; the keyword rule is then permanent.
    ai: Option<AiService<P>>,
}

impl<P: AiProvider> ModerationService<P> {
    pub fn new(ai: Option<AiService<P>>) -> Self {
        Self { ai }
    }

    pub fn keyword_only() -> Self {
        Self { ai: None }
    }

    pub fn uses_remote_model(&self) -> bool {
        self.ai.is_some()
    }

    /// Classify a piece of user content.
    pub async fn classify(&self, text: &str) -> ModerationVerdict {
        let Some(ai) = &self.ai else {
            return classify_by_keywords(text);
        };

        match ai
            .complete_json::<ModerationVerdict>(&Self::classification_prompt(text))
            .await
        {
            Ok(verdict) => {
                let verdict = verdict.normalized();
                tracing::debug!(
                    flagged = verdict.flagged,
                    categories = ?verdict.categories,
                    "Remote moderation verdict"
                );
                verdict
            }
            Err(e) => {
                tracing::warn!("Moderation model failed, using keyword fallback: {}", e);
                classify_by_keywords(text)
            }
        }
    }

    /// Produce a short supportive reply to a distressed user.
    pub async fn support_reply(&self, text: &str) -> String {
        let Some(ai) = &self.ai else {
            return CANNED_SUPPORT_REPLY.to_string();
        };

        let prompt = format!("User message: \"{}\"", text);
        match ai.complete(Some(SUPPORT_PERSONA), &prompt).await {
            Ok(reply) if !reply.is_empty() => reply,
            Ok(_) => {
                tracing::warn!("Support model returned an empty reply, using canned message");
                CANNED_SUPPORT_REPLY.to_string()
            }
            Err(e) => {
                tracing::warn!("Support model failed, using canned message: {}", e);
                CANNED_SUPPORT_REPLY.to_string()
            }
        }
    }

    fn classification_prompt(text: &str) -> String {
        let categories = KNOWN_CATEGORIES
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Analyze the following text for harmful content.\n\
             Return a JSON object with the following structure:\n\
             {{\n  \"flagged\": boolean,\n  \"categories\": string[]\n}}\n\
             Categories can include: {categories}.\n\
             If the text contains self-harm content, ensure \"{SELF_HARM}\" is in the categories.\n\
             Respond with the JSON object only.\n\n\
             Text: \"{text}\""
        )
    }
}
