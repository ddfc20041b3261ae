// SQLite-backed forum store.
//
// Tables:
// - posts: Posts with denormalized like/view counters
// - comments: User comments and automated replies (author_id NULL, is_ai = 1)
// - post_likes: One row per (user, post), enforced by a unique index
// - reports: Write-only moderation reports
//
// SQLite has no stored procedures; the two atomic counter statements stand in
// for the backend's `increment_likes`/`decrement_likes` and can be switched
// off to exercise the read-modify-write fallback.

use crate::core::forum::{
    ClientOptions, Comment, CommentAuthor, CommentId, ForumError, ForumStore, LikeInsert, Post,
    PostId, Report, ReportId, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

pub struct SqliteForumStore {
    pool: SqlitePool,
    counter_procedures: bool,
    options: ClientOptions,
}

impl SqliteForumStore {
    /// Open (or create) the database file at `database_path` and run migrations.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let connection_string = format!("sqlite://{}?mode=rwc", database_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await?;

        Self::from_pool(pool).await
    }

    /// A private in-memory database. One connection, kept open for the
    /// lifetime of the pool, so every handle sees the same data.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        let store = Self {
            pool,
            counter_procedures: true,
            options: ClientOptions::public(),
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Behave like a backend where the counter procedures were never installed.
    pub fn with_counter_procedures(mut self, enabled: bool) -> Self {
        self.counter_procedures = enabled;
        self
    }

    /// Run database migrations to create required tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                author_id TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                likes INTEGER NOT NULL DEFAULT 0,
                views INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_author
                ON posts(author_id, created_at DESC);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                author_id TEXT,
                is_ai BOOLEAN NOT NULL DEFAULT 0,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                CHECK ((is_ai = 1 AND author_id IS NULL) OR (is_ai = 0 AND author_id IS NOT NULL))
            );
            CREATE INDEX IF NOT EXISTS idx_comments_post
                ON comments(post_id, created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS post_likes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                UNIQUE (user_id, post_id)
            );
            CREATE INDEX IF NOT EXISTS idx_post_likes_post
                ON post_likes(post_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                reporter_id TEXT NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn ensure_procedures(&self, name: &str) -> Result<(), ForumError> {
        if self.counter_procedures {
            Ok(())
        } else {
            Err(ForumError::ProcedureUnavailable(name.to_string()))
        }
    }
}

fn storage(e: impl std::fmt::Display) -> ForumError {
    ForumError::Storage(e.to_string())
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ForumError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(storage)
}

fn parse_uuid(raw: &str) -> Result<Uuid, ForumError> {
    Uuid::parse_str(raw).map_err(storage)
}

fn row_to_post(row: &SqliteRow) -> Result<Post, ForumError> {
    let tags_json: String = row.get("tags");

    Ok(Post {
        id: PostId(parse_uuid(row.get("id"))?),
        author: UserId(parse_uuid(row.get("author_id"))?),
        title: row.get("title"),
        body: row.get("body"),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        likes: row.get("likes"),
        views: row.get("views"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_comment(row: &SqliteRow) -> Result<Comment, ForumError> {
    let is_ai: bool = row.get("is_ai");
    let author = match row.get::<Option<String>, _>("author_id") {
        Some(id) if !is_ai => CommentAuthor::User(UserId(parse_uuid(&id)?)),
        _ => CommentAuthor::System,
    };

    Ok(Comment {
        id: CommentId(parse_uuid(row.get("id"))?),
        post_id: PostId(parse_uuid(row.get("post_id"))?),
        author,
        body: row.get("body"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_report(row: &SqliteRow) -> Result<Report, ForumError> {
    let status: String = row.get("status");

    Ok(Report {
        id: ReportId(parse_uuid(row.get("id"))?),
        post_id: PostId(parse_uuid(row.get("post_id"))?),
        reporter: UserId(parse_uuid(row.get("reporter_id"))?),
        reason: row.get("reason"),
        status: FromStr::from_str(&status).map_err(storage)?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

const POST_COLUMNS: &str = "id, author_id, title, body, tags, likes, views, created_at";

#[async_trait]
impl ForumStore for SqliteForumStore {
    fn scoped(&self, options: ClientOptions) -> Self {
        Self {
            pool: self.pool.clone(),
            counter_procedures: self.counter_procedures,
            options,
        }
    }

    async fn insert_post(&self, post: &Post) -> Result<(), ForumError> {
        self.options.authorize_write(post.author)?;
        let tags_json = serde_json::to_string(&post.tags).map_err(storage)?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, title, body, tags, likes, views, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.id.to_string())
        .bind(post.author.to_string())
        .bind(&post.title)
        .bind(&post.body)
        .bind(tags_json)
        .bind(post.likes)
        .bind(post.views)
        .bind(timestamp(&post.created_at))
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, ForumError> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.as_ref().map(row_to_post).transpose()
    }

    async fn list_posts(&self, limit: usize) -> Result<Vec<Post>, ForumError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts ORDER BY created_at DESC, rowid DESC LIMIT ?",
            POST_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_post).collect()
    }

    async fn list_posts_by_author(&self, author: UserId) -> Result<Vec<Post>, ForumError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE author_id = ? ORDER BY created_at DESC, rowid DESC",
            POST_COLUMNS
        ))
        .bind(author.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_post).collect()
    }

    async fn increment_views(&self, id: PostId) -> Result<(), ForumError> {
        self.options.authorize_any_user()?;
        sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), ForumError> {
        match comment.author {
            CommentAuthor::User(user) => self.options.authorize_write(user)?,
            CommentAuthor::System => self.options.require_elevated("automated comment")?,
        }

        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, author_id, is_ai, body, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.id.to_string())
        .bind(comment.post_id.to_string())
        .bind(comment.author.user_id().map(|u| u.to_string()))
        .bind(comment.is_automated())
        .bind(&comment.body)
        .bind(timestamp(&comment.created_at))
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, ForumError> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, author_id, is_ai, body, created_at
            FROM comments
            WHERE post_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(post_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_comment).collect()
    }

    async fn insert_like(&self, user: UserId, post_id: PostId) -> Result<LikeInsert, ForumError> {
        self.options.authorize_write(user)?;

        let result = sqlx::query(
            r#"
            INSERT INTO post_likes (id, user_id, post_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, post_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user.to_string())
        .bind(post_id.to_string())
        .bind(timestamp(&Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            Ok(LikeInsert::AlreadyPresent)
        } else {
            Ok(LikeInsert::Inserted)
        }
    }

    async fn delete_like(&self, user: UserId, post_id: PostId) -> Result<bool, ForumError> {
        self.options.authorize_write(user)?;

        let result = sqlx::query("DELETE FROM post_likes WHERE user_id = ? AND post_id = ?")
            .bind(user.to_string())
            .bind(post_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_like(&self, user: UserId, post_id: PostId) -> Result<bool, ForumError> {
        let row = sqlx::query("SELECT 1 FROM post_likes WHERE user_id = ? AND post_id = ?")
            .bind(user.to_string())
            .bind(post_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.is_some())
    }

    async fn liked_post_ids(&self, user: UserId) -> Result<Vec<PostId>, ForumError> {
        let rows = sqlx::query(
            "SELECT post_id FROM post_likes WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter()
            .map(|row| parse_uuid(row.get("post_id")).map(PostId))
            .collect()
    }

    async fn count_likes(&self, post_id: PostId) -> Result<i64, ForumError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM post_likes WHERE post_id = ?")
            .bind(post_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.get("total"))
    }

    async fn increment_likes(&self, post_id: PostId) -> Result<(), ForumError> {
        self.ensure_procedures("increment_likes")?;
        self.options.authorize_any_user()?;

        sqlx::query("UPDATE posts SET likes = likes + 1 WHERE id = ?")
            .bind(post_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn decrement_likes(&self, post_id: PostId) -> Result<(), ForumError> {
        self.ensure_procedures("decrement_likes")?;
        self.options.authorize_any_user()?;

        sqlx::query("UPDATE posts SET likes = MAX(likes - 1, 0) WHERE id = ?")
            .bind(post_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn like_count(&self, post_id: PostId) -> Result<Option<i64>, ForumError> {
        let row = sqlx::query("SELECT likes FROM posts WHERE id = ?")
            .bind(post_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(|r| r.get("likes")))
    }

    async fn set_like_count(&self, post_id: PostId, count: i64) -> Result<(), ForumError> {
        self.options.require_elevated("set_like_count")?;

        sqlx::query("UPDATE posts SET likes = ? WHERE id = ?")
            .bind(count)
            .bind(post_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn insert_report(&self, report: &Report) -> Result<(), ForumError> {
        self.options.authorize_write(report.reporter)?;

        sqlx::query(
            r#"
            INSERT INTO reports (id, post_id, reporter_id, reason, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(report.id.to_string())
        .bind(report.post_id.to_string())
        .bind(report.reporter.to_string())
        .bind(&report.reason)
        .bind(report.status.as_str())
        .bind(timestamp(&report.created_at))
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn reports_for_post(&self, post_id: PostId) -> Result<Vec<Report>, ForumError> {
        self.options.require_elevated("reports_for_post")?;

        let rows = sqlx::query(
            r#"
            SELECT id, post_id, reporter_id, reason, status, created_at
            FROM reports
            WHERE post_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(post_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(row_to_report).collect()
    }
}
