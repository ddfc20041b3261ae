// Moderation domain models - verdicts and intervention outcomes.
//
// These are pure domain types; the forum service turns an `Intervention`
// into persistence calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Category label for self-harm disclosures.
pub const SELF_HARM: &str = "self-harm";

/// Category labels the classifier prompt offers to the model.
pub const KNOWN_CATEGORIES: &[&str] = &["hate", "harassment", SELF_HARM, "violence", "sexual"];

/// Result of classifying a piece of user content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModerationVerdict {
    /// Whether the content warrants attention.
    pub flagged: bool,
    /// Why it was flagged. Empty when not flagged by the keyword rule; the
    /// remote classifier is trusted as returned.
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl ModerationVerdict {
    /// A verdict that lets content through untouched.
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn flagged<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flagged: true,
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_self_harm(&self) -> bool {
        self.categories.contains(SELF_HARM)
    }

    /// Lowercases and trims labels returned by a remote model, dropping blanks.
    pub fn normalized(self) -> Self {
        let categories = self
            .categories
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        Self {
            flagged: self.flagged,
            categories,
        }
    }
}

/// What kind of content is being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Post,
    Comment,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Post => write!(f, "post"),
            ContentKind::Comment => write!(f, "comment"),
        }
    }
}

/// What should happen to submitted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intervention {
    /// Persist as-is.
    Allow,
    /// Reject before anything is persisted.
    Block,
    /// Persist, then attach an automated supportive reply.
    AllowAndRespond,
}
