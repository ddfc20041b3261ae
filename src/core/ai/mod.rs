pub mod ai_service;
pub mod models;

pub use ai_service::{AiProvider, AiService};
pub use models::{AiConfig, AiMessage, AiProviderResponse, ResponseFormat};
