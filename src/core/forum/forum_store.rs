// Persistence port for the forum.
//
// Implementations live in infra (SQLite for production, DashMap in memory).
// Handles carry their `ClientOptions` and enforce the row-level rules
// themselves, the way the hosted backend enforced them for the web app.

use super::forum_models::{Comment, LikeInsert, Post, PostId, Report, UserId};
use super::session::ClientOptions;
use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Content violates community guidelines: {categories:?}")]
    PolicyViolation { categories: BTreeSet<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Counter procedure unavailable: {0}")]
    ProcedureUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait ForumStore: Send + Sync {
    /// Build a new handle on the same backend with the given options.
    fn scoped(&self, options: ClientOptions) -> Self
    where
        Self: Sized;

    // --- posts ---

    async fn insert_post(&self, post: &Post) -> Result<(), ForumError>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, ForumError>;

    /// Newest first.
    async fn list_posts(&self, limit: usize) -> Result<Vec<Post>, ForumError>;

    /// Newest first.
    async fn list_posts_by_author(&self, author: UserId) -> Result<Vec<Post>, ForumError>;

    async fn increment_views(&self, id: PostId) -> Result<(), ForumError>;

    // --- comments ---

    /// System-authored comments need an elevated handle.
    async fn insert_comment(&self, comment: &Comment) -> Result<(), ForumError>;

    /// Oldest first.
    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, ForumError>;

    // --- likes ---

    /// Idempotent: a second insert for the same pair reports `AlreadyPresent`.
    async fn insert_like(&self, user: UserId, post_id: PostId) -> Result<LikeInsert, ForumError>;

    /// Returns whether a row was removed.
    async fn delete_like(&self, user: UserId, post_id: PostId) -> Result<bool, ForumError>;

    async fn has_like(&self, user: UserId, post_id: PostId) -> Result<bool, ForumError>;

    async fn liked_post_ids(&self, user: UserId) -> Result<Vec<PostId>, ForumError>;

    /// Number of like rows for a post (the true count).
    async fn count_likes(&self, post_id: PostId) -> Result<i64, ForumError>;

    // --- like counter ---

    /// Atomic `likes = likes + 1`. May be unavailable on some backends.
    async fn increment_likes(&self, post_id: PostId) -> Result<(), ForumError>;

    /// Atomic `likes = max(likes - 1, 0)`. May be unavailable on some backends.
    async fn decrement_likes(&self, post_id: PostId) -> Result<(), ForumError>;

    /// The stored counter, `None` when the post does not exist.
    async fn like_count(&self, post_id: PostId) -> Result<Option<i64>, ForumError>;

    /// Overwrite the counter. Elevated only.
    async fn set_like_count(&self, post_id: PostId, count: i64) -> Result<(), ForumError>;

    // --- reports ---

    async fn insert_report(&self, report: &Report) -> Result<(), ForumError>;

    /// Newest first. Elevated only.
    async fn reports_for_post(&self, post_id: PostId) -> Result<Vec<Report>, ForumError>;
}
