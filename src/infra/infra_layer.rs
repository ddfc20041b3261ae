// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "forum/mod.rs"]
pub mod forum;

#[path = "ai/mod.rs"]
pub mod ai;
