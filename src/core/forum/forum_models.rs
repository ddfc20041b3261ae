// Forum domain models - posts, comments, likes and reports.
//
// Identifiers are UUIDs; the console derives user ids from names, the
// stores generate the rest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// IDENTIFIERS
// ============================================================================

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
    // Ids minted by this crate get a random constructor.
    ($name:ident, random) => {
        uuid_id!($name);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }
    };
}

uuid_id!(UserId);
uuid_id!(PostId, random);
uuid_id!(CommentId, random);
uuid_id!(ReportId, random);

impl UserId {
    /// Stable id for a display name, so the same name always maps to the same user.
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.trim().as_bytes()))
    }
}

// ============================================================================
// POSTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    /// Denormalized; may drift from the number of like rows.
    pub likes: i64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author: UserId, title: String, body: String, tags: Vec<String>) -> Self {
        Self {
            id: PostId::new(),
            author,
            title,
            body,
            tags,
            likes: 0,
            views: 0,
            created_at: Utc::now(),
        }
    }
}

/// What a user submits to create a post.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    /// Comma-separated, as typed by the user.
    pub tags: String,
}

/// Split a comma-separated tag string, trimming and dropping blanks.
/// Order and duplicates are kept.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// COMMENTS
// ============================================================================

/// Who wrote a comment. Automated replies have no user behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentAuthor {
    User(UserId),
    System,
}

impl CommentAuthor {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            CommentAuthor::User(id) => Some(*id),
            CommentAuthor::System => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: CommentAuthor,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn by_user(post_id: PostId, user: UserId, body: String) -> Self {
        Self::new(post_id, CommentAuthor::User(user), body)
    }

    pub fn automated(post_id: PostId, body: String) -> Self {
        Self::new(post_id, CommentAuthor::System, body)
    }

    fn new(post_id: PostId, author: CommentAuthor, body: String) -> Self {
        Self {
            id: CommentId::new(),
            post_id,
            author,
            body,
            created_at: Utc::now(),
        }
    }

    pub fn is_automated(&self) -> bool {
        self.author == CommentAuthor::System
    }
}

/// Result of submitting a comment: the user's comment plus the supportive
/// reply, when one was injected.
#[derive(Debug, Clone)]
pub struct CommentOutcome {
    pub comment: Comment,
    pub automated_reply: Option<Comment>,
}

// ============================================================================
// LIKES
// ============================================================================

/// Outcome of the idempotent like insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeInsert {
    Inserted,
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    NotLiked,
}

impl LikeState {
    pub fn from_exists(exists: bool) -> Self {
        if exists {
            LikeState::Liked
        } else {
            LikeState::NotLiked
        }
    }
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Dismissed,
}

#[derive(Debug, Error)]
#[error("Unknown report status: {0}")]
pub struct UnknownReportStatus(String);

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = UnknownReportStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "dismissed" => Ok(ReportStatus::Dismissed),
            other => Err(UnknownReportStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub post_id: PostId,
    pub reporter: UserId,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn pending(post_id: PostId, reporter: UserId, reason: String) -> Self {
        Self {
            id: ReportId::new(),
            post_id,
            reporter,
            reason,
            status: ReportStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// READ MODELS
// ============================================================================

/// A post with its comments, as shown on the post page.
#[derive(Debug, Clone)]
pub struct PostThread {
    pub post: Post,
    /// Oldest first.
    pub comments: Vec<Comment>,
    pub liked: LikeState,
}

/// The caller's own activity.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: UserId,
    /// Newest first.
    pub posts: Vec<Post>,
    pub liked_post_ids: Vec<PostId>,
}
