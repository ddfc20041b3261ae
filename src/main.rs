// This is the entry point of the Safe House forum console.
//
// **Architecture Overview:**
// - `core/` = Business logic (moderation, intervention policy, forum rules)
// - `infra/` = Implementations of core traits (SQLite, in-memory, AI APIs)
// - `console/` = Line-oriented adapter (commands in, text out)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Hand stdin/stdout to the console adapter

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "console/console_layer.rs"]
mod console;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::{AiSettings, AppConfig, ProviderKind, StoreBackend};
use crate::console::Data;
use crate::core::ai::{AiConfig, AiProvider, AiService};
use crate::core::forum::{ForumService, ForumSettings, ForumStore, UserId};
use crate::core::moderation::ModerationService;
use crate::infra::ai::{GeminiClient, OpenRouterClient};
use crate::infra::forum::{InMemoryForumStore, SqliteForumStore};
use anyhow::Context;
use std::sync::Arc;

type Moderation = ModerationService<Box<dyn AiProvider>>;

fn build_moderation(settings: Option<&AiSettings>) -> Moderation {
    let Some(settings) = settings else {
        tracing::warn!("No AI provider key configured, moderation uses the keyword filter only");
        return ModerationService::keyword_only();
    };

    let provider: Box<dyn AiProvider> = match settings.provider {
        ProviderKind::Gemini => Box::new(GeminiClient::new(settings.api_key.clone())),
        ProviderKind::OpenRouter => Box::new(OpenRouterClient::new(settings.api_key.clone())),
    };
    tracing::info!(
        provider = ?settings.provider,
        model = %settings.model,
        "Moderation backed by language model"
    );

    ModerationService::new(Some(AiService::new(
        provider,
        AiConfig::new(settings.model.clone()),
    )))
}

async fn serve<S: ForumStore + 'static>(
    store: S,
    moderation: Moderation,
    settings: ForumSettings,
) -> anyhow::Result<()> {
    tracing::info!(
        remote_model = moderation.uses_remote_model(),
        feed_limit = settings.feed_limit,
        operators = settings.operators.len(),
        "Forum ready"
    );
    let data = Data {
        forum: Arc::new(ForumService::new(store, moderation, settings)),
    };

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    console::run(data, stdin, tokio::io::stdout())
        .await
        .map_err(|e| anyhow::anyhow!("console error: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with console replies.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    dotenv::dotenv().ok();

    let config = AppConfig::from_env();
    tracing::debug!(?config, "Configuration loaded");

    let moderation = build_moderation(config.ai.as_ref());
    let settings = ForumSettings {
        feed_limit: config.feed_limit,
        operators: config
            .operators
            .iter()
            .map(|name| UserId::from_name(name))
            .collect(),
    };

    match config.store {
        StoreBackend::Sqlite => {
            std::fs::create_dir_all(&config.data_dir).with_context(|| {
                format!("Failed to create data directory {}", config.data_dir.display())
            })?;
            let db_path = config.database_path();
            let store = SqliteForumStore::new(&db_path.to_string_lossy())
                .await
                .context("Failed to initialize SQLite forum store")?
                .with_counter_procedures(config.counter_procedures);
            tracing::info!(path = %db_path.display(), "Using SQLite forum store");

            serve(store, moderation, settings).await
        }
        StoreBackend::Memory => {
            let mut store = InMemoryForumStore::new();
            if !config.counter_procedures {
                store = store.without_counter_procedures();
            }
            tracing::info!("Using in-memory forum store, nothing will be saved");

            serve(store, moderation, settings).await
        }
    }
}
