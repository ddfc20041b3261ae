// In-memory implementation of ForumStore.
//
// Useful for tests and for running the console without a database file.
// All handles built with `scoped` share the same tables.

use crate::core::forum::{
    ClientOptions, Comment, CommentAuthor, ForumError, ForumStore, LikeInsert, Post, PostId,
    Report, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    posts: DashMap<PostId, Post>,
    /// post id -> comments in insertion order
    comments: DashMap<PostId, Vec<Comment>>,
    /// (user, post) -> when it was liked
    likes: DashMap<(UserId, PostId), DateTime<Utc>>,
    reports: DashMap<PostId, Vec<Report>>,
}

pub struct InMemoryForumStore {
    tables: Arc<Tables>,
    counter_procedures: bool,
    options: ClientOptions,
}

impl InMemoryForumStore {
    /// Create a new empty store with the atomic counter procedures available.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Tables::default()),
            counter_procedures: true,
            options: ClientOptions::public(),
        }
    }

    /// Behave like a backend where `increment_likes`/`decrement_likes` were never installed.
    pub fn without_counter_procedures(mut self) -> Self {
        self.counter_procedures = false;
        self
    }

    fn ensure_post(&self, post_id: PostId) -> Result<(), ForumError> {
        if self.tables.posts.contains_key(&post_id) {
            Ok(())
        } else {
            Err(ForumError::NotFound(format!("post {}", post_id)))
        }
    }

    fn ensure_procedures(&self, name: &str) -> Result<(), ForumError> {
        if self.counter_procedures {
            Ok(())
        } else {
            Err(ForumError::ProcedureUnavailable(name.to_string()))
        }
    }
}

impl Default for InMemoryForumStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForumStore for InMemoryForumStore {
    fn scoped(&self, options: ClientOptions) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            counter_procedures: self.counter_procedures,
            options,
        }
    }

    async fn insert_post(&self, post: &Post) -> Result<(), ForumError> {
        self.options.authorize_write(post.author)?;

        match self.tables.posts.entry(post.id) {
            Entry::Occupied(_) => Err(ForumError::Storage(format!(
                "duplicate post id {}",
                post.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(post.clone());
                Ok(())
            }
        }
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, ForumError> {
        Ok(self.tables.posts.get(&id).map(|p| p.clone()))
    }

    async fn list_posts(&self, limit: usize) -> Result<Vec<Post>, ForumError> {
        let mut posts: Vec<Post> = self.tables.posts.iter().map(|p| p.clone()).collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn list_posts_by_author(&self, author: UserId) -> Result<Vec<Post>, ForumError> {
        let mut posts: Vec<Post> = self
            .tables
            .posts
            .iter()
            .filter(|p| p.author == author)
            .map(|p| p.clone())
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn increment_views(&self, id: PostId) -> Result<(), ForumError> {
        self.options.authorize_any_user()?;
        if let Some(mut post) = self.tables.posts.get_mut(&id) {
            post.views += 1;
        }
        Ok(())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), ForumError> {
        match comment.author {
            CommentAuthor::User(user) => self.options.authorize_write(user)?,
            CommentAuthor::System => self.options.require_elevated("automated comment")?,
        }
        self.ensure_post(comment.post_id)?;

        self.tables
            .comments
            .entry(comment.post_id)
            .or_default()
            .push(comment.clone());
        Ok(())
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, ForumError> {
        Ok(self
            .tables
            .comments
            .get(&post_id)
            .map(|c| c.clone())
            .unwrap_or_default())
    }

    async fn insert_like(&self, user: UserId, post_id: PostId) -> Result<LikeInsert, ForumError> {
        self.options.authorize_write(user)?;
        self.ensure_post(post_id)?;

        // entry() holds the shard lock, so two racing inserts cannot both win
        match self.tables.likes.entry((user, post_id)) {
            Entry::Occupied(_) => Ok(LikeInsert::AlreadyPresent),
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                Ok(LikeInsert::Inserted)
            }
        }
    }

    async fn delete_like(&self, user: UserId, post_id: PostId) -> Result<bool, ForumError> {
        self.options.authorize_write(user)?;
        Ok(self.tables.likes.remove(&(user, post_id)).is_some())
    }

    async fn has_like(&self, user: UserId, post_id: PostId) -> Result<bool, ForumError> {
        Ok(self.tables.likes.contains_key(&(user, post_id)))
    }

    async fn liked_post_ids(&self, user: UserId) -> Result<Vec<PostId>, ForumError> {
        let mut liked: Vec<(DateTime<Utc>, PostId)> = self
            .tables
            .likes
            .iter()
            .filter(|entry| entry.key().0 == user)
            .map(|entry| (*entry.value(), entry.key().1))
            .collect();
        liked.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(liked.into_iter().map(|(_, id)| id).collect())
    }

    async fn count_likes(&self, post_id: PostId) -> Result<i64, ForumError> {
        let count = self
            .tables
            .likes
            .iter()
            .filter(|entry| entry.key().1 == post_id)
            .count();
        Ok(count as i64)
    }

    async fn increment_likes(&self, post_id: PostId) -> Result<(), ForumError> {
        self.ensure_procedures("increment_likes")?;
        self.options.authorize_any_user()?;
        if let Some(mut post) = self.tables.posts.get_mut(&post_id) {
            post.likes += 1;
        }
        Ok(())
    }

    async fn decrement_likes(&self, post_id: PostId) -> Result<(), ForumError> {
        self.ensure_procedures("decrement_likes")?;
        self.options.authorize_any_user()?;
        if let Some(mut post) = self.tables.posts.get_mut(&post_id) {
            post.likes = (post.likes - 1).max(0);
        }
        Ok(())
    }

    async fn like_count(&self, post_id: PostId) -> Result<Option<i64>, ForumError> {
        Ok(self.tables.posts.get(&post_id).map(|p| p.likes))
    }

    async fn set_like_count(&self, post_id: PostId, count: i64) -> Result<(), ForumError> {
        self.options.require_elevated("set_like_count")?;
        if let Some(mut post) = self.tables.posts.get_mut(&post_id) {
            post.likes = count;
        }
        Ok(())
    }

    async fn insert_report(&self, report: &Report) -> Result<(), ForumError> {
        self.options.authorize_write(report.reporter)?;
        self.ensure_post(report.post_id)?;

        self.tables
            .reports
            .entry(report.post_id)
            .or_default()
            .push(report.clone());
        Ok(())
    }

    async fn reports_for_post(&self, post_id: PostId) -> Result<Vec<Report>, ForumError> {
        self.options.require_elevated("reports_for_post")?;
        let mut reports = self
            .tables
            .reports
            .get(&post_id)
            .map(|r| r.clone())
            .unwrap_or_default();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }
}
