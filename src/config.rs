// Application configuration, read from the environment (after `.env` is loaded).
//
// Parsing goes through a lookup closure so tests never touch the process
// environment. Unparseable values fall back to their defaults with a warning.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_OPENROUTER_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";
const DEFAULT_FEED_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenRouter,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(format!("unknown AI provider '{}'", other)),
        }
    }
}

/// The selected language-model provider. Only present when its API key is set.
#[derive(Clone, PartialEq)]
pub struct AiSettings {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
}

// Hand-written so the API key never reaches the logs.
impl fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiSettings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub data_dir: PathBuf,
    pub counter_procedures: bool,
    pub ai: Option<AiSettings>,
    pub feed_limit: usize,
    /// Login names with operator rights.
    pub operators: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = parse_or(&read, "AI_PROVIDER", ProviderKind::Gemini);
        let (key_var, model_var, default_model) = match provider {
            ProviderKind::Gemini => ("GEMINI_API_KEY", "GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            ProviderKind::OpenRouter => (
                "OPENROUTER_API_KEY",
                "OPENROUTER_MODEL",
                DEFAULT_OPENROUTER_MODEL,
            ),
        };
        let ai = read(key_var).map(|api_key| AiSettings {
            provider,
            api_key: api_key.trim().to_string(),
            model: read(model_var).unwrap_or_else(|| default_model.to_string()),
        });

        let operators = read("SAFE_HOUSE_OPERATORS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            store: parse_or(&read, "SAFE_HOUSE_STORE", StoreBackend::Sqlite),
            data_dir: read("SAFE_HOUSE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            counter_procedures: parse_or(&read, "SAFE_HOUSE_COUNTER_PROCEDURES", true),
            ai,
            feed_limit: parse_or(&read, "SAFE_HOUSE_FEED_LIMIT", DEFAULT_FEED_LIMIT),
            operators,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("safe_house.db")
    }
}

fn parse_or<T, F>(read: &F, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = read(key) else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Ignoring invalid {}={:?}: {}", key, raw, e);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.counter_procedures);
        assert_eq!(config.ai, None);
        assert_eq!(config.feed_limit, 20);
        assert!(config.operators.is_empty());
    }

    #[test]
    fn test_gemini_enabled_by_key() {
        let config = config_from(&[("GEMINI_API_KEY", "secret")]);

        let ai = config.ai.expect("gemini settings");
        assert_eq!(ai.provider, ProviderKind::Gemini);
        assert_eq!(ai.model, "gemini-2.5-flash");
        assert!(!format!("{:?}", ai).contains("secret"));
    }

    #[test]
    fn test_openrouter_reads_its_own_key() {
        let config = config_from(&[
            ("AI_PROVIDER", "OpenRouter"),
            ("GEMINI_API_KEY", "gemini-secret"),
        ]);
        assert_eq!(config.ai, None);

        let config = config_from(&[
            ("AI_PROVIDER", "openrouter"),
            ("OPENROUTER_API_KEY", "or-secret"),
            ("OPENROUTER_MODEL", "some/model"),
        ]);
        let ai = config.ai.expect("openrouter settings");
        assert_eq!(ai.provider, ProviderKind::OpenRouter);
        assert_eq!(ai.model, "some/model");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("SAFE_HOUSE_STORE", "postgres"),
            ("SAFE_HOUSE_FEED_LIMIT", "lots"),
            ("SAFE_HOUSE_COUNTER_PROCEDURES", "maybe"),
        ]);

        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.feed_limit, 20);
        assert!(config.counter_procedures);
    }

    #[test]
    fn test_store_and_operator_overrides() {
        let config = config_from(&[
            ("SAFE_HOUSE_STORE", "memory"),
            ("SAFE_HOUSE_COUNTER_PROCEDURES", "false"),
            ("SAFE_HOUSE_OPERATORS", " alice, ,bob "),
            ("SAFE_HOUSE_DATA_DIR", "/tmp/sh"),
        ]);

        assert_eq!(config.store, StoreBackend::Memory);
        assert!(!config.counter_procedures);
        assert_eq!(config.operators, vec!["alice", "bob"]);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/sh/safe_house.db"));
    }
}
