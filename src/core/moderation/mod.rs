// Core moderation module - content classification and intervention policy.

pub mod intervention;
pub mod keyword_filter;
pub mod moderation_models;
pub mod moderation_service;

pub use moderation_models::*;
pub use moderation_service::*;
