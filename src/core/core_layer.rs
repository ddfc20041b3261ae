// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "forum/mod.rs"]
pub mod forum;
