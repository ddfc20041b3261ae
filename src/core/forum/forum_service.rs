// Forum service - core business logic for posts, comments, likes and reports.
//
// This service handles:
// - Moderating new posts and comments and applying the intervention policy
// - Injecting automated supportive replies through an elevated store handle
// - The like toggle, with best-effort maintenance of the denormalized counter
// - Reports and the read side (feed, post page, profile)
//
// Store handles are built per call from the caller's session; nothing is
// shared between requests except the backend itself.

use super::forum_models::{
    parse_tags, Comment, CommentOutcome, LikeInsert, LikeState, Post, PostDraft, PostId,
    PostThread, Profile, Report, UserId,
};
use super::forum_store::{ForumError, ForumStore};
use super::session::{ClientOptions, Session};
use crate::core::ai::AiProvider;
use crate::core::moderation::intervention::decide;
use crate::core::moderation::{ContentKind, Intervention, ModerationService, ModerationVerdict};
use std::collections::HashSet;

/// Settings for the forum service.
#[derive(Debug, Clone)]
pub struct ForumSettings {
    /// Default number of posts returned by `feed`.
    pub feed_limit: usize,
    /// Users allowed to run operator actions (counter repair, report review).
    pub operators: HashSet<UserId>,
}

impl Default for ForumSettings {
    fn default() -> Self {
        Self {
            feed_limit: 20,
            operators: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CounterChange {
    Increment,
    Decrement,
}

pub struct ForumService<S: ForumStore, P: AiProvider> {
    /// Template handle; only ever used through `scoped`.
    store: S,
    moderation: ModerationService<P>,
    settings: ForumSettings,
}

impl<S: ForumStore, P: AiProvider> ForumService<S, P> {
    pub fn new(store: S, moderation: ModerationService<P>, settings: ForumSettings) -> Self {
        Self {
            store,
            moderation,
            settings,
        }
    }

    fn user_store(&self, user: UserId) -> S {
        self.store.scoped(ClientOptions::for_user(user))
    }

    fn elevated_store(&self) -> S {
        self.store.scoped(ClientOptions::elevated())
    }

    fn require_operator(&self, session: &Session) -> Result<UserId, ForumError> {
        let user = session.require_user()?;
        if self.settings.operators.contains(&user) {
            Ok(user)
        } else {
            Err(ForumError::Forbidden("operator access required".to_string()))
        }
    }

    fn intervention_for(kind: ContentKind, verdict: &ModerationVerdict) -> Intervention {
        let intervention = decide(kind, verdict);
        tracing::debug!(
            kind = %kind,
            flagged = verdict.flagged,
            intervention = ?intervention,
            "Intervention decided"
        );
        intervention
    }

    async fn existing_post(&self, store: &S, post_id: PostId) -> Result<Post, ForumError> {
        store
            .get_post(post_id)
            .await?
            .ok_or_else(|| ForumError::NotFound(format!("post {}", post_id)))
    }

    // ========================================================================
    // SUBMISSIONS
    // ========================================================================

    /// Create a post, unless moderation blocks it. Title and body are stored
    /// as typed; blank ones are rejected.
    ///
    /// Self-harm disclosures are kept and answered with an automated comment.
    /// If storing that reply fails the post is still returned.
    pub async fn create_post(&self, session: &Session, draft: PostDraft) -> Result<Post, ForumError> {
        let user = session.require_user()?;

        if draft.title.trim().is_empty() || draft.body.trim().is_empty() {
            return Err(ForumError::Validation(
                "Title and content are required".to_string(),
            ));
        }
        let tags = parse_tags(&draft.tags);

        let text = format!("{}\n\n{}", draft.title, draft.body);
        let verdict = self.moderation.classify(&text).await;
        let intervention = Self::intervention_for(ContentKind::Post, &verdict);

        if intervention == Intervention::Block {
            tracing::info!(
                user_id = %user,
                categories = ?verdict.categories,
                "Post blocked by moderation"
            );
            return Err(ForumError::PolicyViolation {
                categories: verdict.categories,
            });
        }

        let post = Post::new(user, draft.title, draft.body, tags);
        self.user_store(user).insert_post(&post).await?;
        tracing::info!(post_id = %post.id, user_id = %user, "Post created");

        if intervention == Intervention::AllowAndRespond {
            if let Err(e) = self.post_automated_reply(post.id, &text).await {
                tracing::warn!(post_id = %post.id, "Failed to add supportive reply: {}", e);
            }
        }

        Ok(post)
    }

    /// Add a comment, stored as typed. Comments are always kept; self-harm
    /// comments also get an automated reply.
    pub async fn submit_comment(
        &self,
        session: &Session,
        post_id: PostId,
        body: &str,
    ) -> Result<CommentOutcome, ForumError> {
        let user = session.require_user()?;

        if body.trim().is_empty() {
            return Err(ForumError::Validation(
                "Comment cannot be empty".to_string(),
            ));
        }

        let store = self.user_store(user);
        self.existing_post(&store, post_id).await?;

        let verdict = self.moderation.classify(body).await;

        let comment = Comment::by_user(post_id, user, body.to_string());
        store.insert_comment(&comment).await?;
        tracing::info!(
            post_id = %post_id,
            comment_id = %comment.id,
            flagged = verdict.flagged,
            "Comment added"
        );

        let automated_reply = match Self::intervention_for(ContentKind::Comment, &verdict) {
            Intervention::AllowAndRespond => Some(self.post_automated_reply(post_id, body).await?),
            Intervention::Allow | Intervention::Block => None,
        };

        Ok(CommentOutcome {
            comment,
            automated_reply,
        })
    }

    async fn post_automated_reply(&self, post_id: PostId, text: &str) -> Result<Comment, ForumError> {
        let reply = self.moderation.support_reply(text).await;
        let comment = Comment::automated(post_id, reply);

        self.elevated_store().insert_comment(&comment).await?;
        tracing::info!(post_id = %post_id, comment_id = %comment.id, "Supportive reply added");
        Ok(comment)
    }

    /// File a report against a post. The reason is stored as typed.
    pub async fn submit_report(
        &self,
        session: &Session,
        post_id: PostId,
        reason: &str,
    ) -> Result<Report, ForumError> {
        let user = session.require_user()?;

        if reason.trim().is_empty() {
            return Err(ForumError::Validation("Reason is required".to_string()));
        }

        let store = self.user_store(user);
        self.existing_post(&store, post_id).await?;

        let report = Report::pending(post_id, user, reason.to_string());
        store.insert_report(&report).await?;
        tracing::info!(post_id = %post_id, report_id = %report.id, "Report submitted");
        Ok(report)
    }

    // ========================================================================
    // LIKES
    // ========================================================================

    /// Flip the caller's like on a post and return the new state.
    ///
    /// Like-row failures are returned to the caller. Counter failures are
    /// logged and swallowed, so the counter may drift from the true count.
    pub async fn toggle_like(&self, session: &Session, post_id: PostId) -> Result<LikeState, ForumError> {
        let user = session.require_user()?;
        let store = self.user_store(user);
        self.existing_post(&store, post_id).await?;

        if store.has_like(user, post_id).await? {
            if store.delete_like(user, post_id).await? {
                self.adjust_like_counter(&store, post_id, CounterChange::Decrement)
                    .await;
            }
            return Ok(LikeState::NotLiked);
        }

        match store.insert_like(user, post_id).await? {
            LikeInsert::Inserted => {
                self.adjust_like_counter(&store, post_id, CounterChange::Increment)
                    .await;
            }
            LikeInsert::AlreadyPresent => {
                tracing::debug!(post_id = %post_id, user_id = %user, "Like already present");
            }
        }
        Ok(LikeState::Liked)
    }

    async fn adjust_like_counter(&self, store: &S, post_id: PostId, change: CounterChange) {
        let procedure = match change {
            CounterChange::Increment => store.increment_likes(post_id).await,
            CounterChange::Decrement => store.decrement_likes(post_id).await,
        };

        let Err(e) = procedure else {
            return;
        };
        tracing::warn!(
            post_id = %post_id,
            "Atomic like counter update failed, falling back to read-modify-write: {}",
            e
        );

        // Not atomic: concurrent toggles can overwrite each other here.
        if let Err(e) = self.rewrite_like_counter(post_id, change).await {
            tracing::warn!(post_id = %post_id, "Like counter not updated, count may drift: {}", e);
        }
    }

    async fn rewrite_like_counter(&self, post_id: PostId, change: CounterChange) -> Result<(), ForumError> {
        let admin = self.elevated_store();
        let Some(current) = admin.like_count(post_id).await? else {
            return Ok(());
        };

        let next = match change {
            CounterChange::Increment => current + 1,
            CounterChange::Decrement => (current - 1).max(0),
        };
        admin.set_like_count(post_id, next).await
    }

    /// Recompute a post's like counter from its like rows. Operators only.
    pub async fn reconcile_like_count(&self, session: &Session, post_id: PostId) -> Result<i64, ForumError> {
        self.require_operator(session)?;
        let admin = self.elevated_store();
        let post = self.existing_post(&admin, post_id).await?;

        let actual = admin.count_likes(post_id).await?;
        if actual != post.likes {
            admin.set_like_count(post_id, actual).await?;
            tracing::info!(
                post_id = %post_id,
                stored = post.likes,
                actual,
                "Like counter reconciled"
            );
        }
        Ok(actual)
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// The newest posts. `limit` defaults to the configured feed size.
    pub async fn feed(&self, session: &Session, limit: Option<usize>) -> Result<Vec<Post>, ForumError> {
        let user = session.require_user()?;
        self.user_store(user)
            .list_posts(limit.unwrap_or(self.settings.feed_limit))
            .await
    }

    /// A post with its comments. Counts one view, best-effort.
    pub async fn open_post(&self, session: &Session, post_id: PostId) -> Result<PostThread, ForumError> {
        let user = session.require_user()?;
        let store = self.user_store(user);
        let mut post = self.existing_post(&store, post_id).await?;

        match store.increment_views(post_id).await {
            Ok(()) => post.views += 1,
            Err(e) => tracing::warn!(post_id = %post_id, "Failed to count view: {}", e),
        }

        let comments = store.list_comments(post_id).await?;
        let liked = LikeState::from_exists(store.has_like(user, post_id).await?);

        Ok(PostThread {
            post,
            comments,
            liked,
        })
    }

    /// The caller's posts and the posts they liked.
    pub async fn profile(&self, session: &Session) -> Result<Profile, ForumError> {
        let user = session.require_user()?;
        let store = self.user_store(user);

        Ok(Profile {
            user,
            posts: store.list_posts_by_author(user).await?,
            liked_post_ids: store.liked_post_ids(user).await?,
        })
    }

    /// Reports filed against a post, newest first. Operators only.
    pub async fn reports_for_post(&self, session: &Session, post_id: PostId) -> Result<Vec<Report>, ForumError> {
        self.require_operator(session)?;
        self.elevated_store().reports_for_post(post_id).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::{AiConfig, AiMessage, AiProviderResponse, AiService};
    use crate::core::moderation::CANNED_SUPPORT_REPLY;
    use crate::infra::forum::InMemoryForumStore;
    use async_trait::async_trait;
    use std::error::Error;

    /// Answers every classification with a fixed verdict and every reply
    /// request with a fixed message.
    struct FixedModel {
        verdict: &'static str,
    }

    #[async_trait]
    impl AiProvider for FixedModel {
        async fn chat_complete(
            &self,
            messages: &[AiMessage],
            _config: &AiConfig,
        ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
            let is_reply = messages.iter().any(|m| m.role == "system");
            let content = if is_reply {
                "We're here with you.".to_string()
            } else {
                self.verdict.to_string()
            };
            Ok(AiProviderResponse {
                content,
                thinking: None,
            })
        }
    }

    type KeywordForum = ForumService<InMemoryForumStore, FixedModel>;

    fn keyword_forum(store: InMemoryForumStore) -> KeywordForum {
        ForumService::new(store, ModerationService::keyword_only(), settings())
    }

    fn model_forum(verdict: &'static str) -> KeywordForum {
        let ai = AiService::new(FixedModel { verdict }, AiConfig::new("test"));
        ForumService::new(
            InMemoryForumStore::new(),
            ModerationService::new(Some(ai)),
            settings(),
        )
    }

    fn settings() -> ForumSettings {
        ForumSettings {
            feed_limit: 20,
            operators: [UserId::from_name("operator")].into_iter().collect(),
        }
    }

    fn session(name: &str) -> Session {
        Session::authenticated(UserId::from_name(name))
    }

    fn draft(title: &str, body: &str) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            body: body.to_string(),
            tags: "Anxiety, Work".to_string(),
        }
    }

    async fn seeded_post(forum: &KeywordForum) -> Post {
        forum
            .create_post(&session("author"), draft("Rough week", "Work has been a lot"))
            .await
            .unwrap()
    }

    // --- authorization & validation ---

    #[tokio::test]
    async fn test_anonymous_actions_are_unauthorized() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let post = seeded_post(&forum).await;
        let anon = Session::anonymous();

        assert!(matches!(
            forum.create_post(&anon, draft("t", "b")).await,
            Err(ForumError::Unauthorized)
        ));
        assert!(matches!(
            forum.submit_comment(&anon, post.id, "hi").await,
            Err(ForumError::Unauthorized)
        ));
        assert!(matches!(
            forum.toggle_like(&anon, post.id).await,
            Err(ForumError::Unauthorized)
        ));
        assert!(matches!(
            forum.submit_report(&anon, post.id, "spam").await,
            Err(ForumError::Unauthorized)
        ));
        assert!(matches!(
            forum.feed(&anon, None).await,
            Err(ForumError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_missing_fields_fail_before_persistence() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let me = session("me");

        assert!(matches!(
            forum.create_post(&me, draft("  ", "body")).await,
            Err(ForumError::Validation(_))
        ));
        assert!(matches!(
            forum.create_post(&me, draft("title", "")).await,
            Err(ForumError::Validation(_))
        ));
        assert!(forum.feed(&me, None).await.unwrap().is_empty());

        let post = seeded_post(&forum).await;
        assert!(matches!(
            forum.submit_comment(&me, post.id, "   ").await,
            Err(ForumError::Validation(_))
        ));
        assert!(matches!(
            forum.submit_report(&me, post.id, " ").await,
            Err(ForumError::Validation(_))
        ));
    }

    // --- posts ---

    #[tokio::test]
    async fn test_clean_post_is_persisted_without_reply() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let me = session("me");

        let post = forum
            .create_post(&me, draft("Feedback", "this app is terrible"))
            .await
            .unwrap();

        assert_eq!(post.tags, vec!["Anxiety", "Work"]);
        assert_eq!((post.likes, post.views), (0, 0));
        let thread = forum.open_post(&me, post.id).await.unwrap();
        assert!(thread.comments.is_empty());
    }

    #[tokio::test]
    async fn test_self_harm_post_gets_one_automated_reply() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let me = session("me");

        let post = forum
            .create_post(&me, draft("Tonight", "I want to kill myself"))
            .await
            .unwrap();

        let thread = forum.open_post(&me, post.id).await.unwrap();
        assert_eq!(forum.feed(&me, None).await.unwrap().len(), 1);
        assert_eq!(thread.comments.len(), 1);
        assert!(thread.comments[0].is_automated());
        assert_eq!(thread.comments[0].body, CANNED_SUPPORT_REPLY);
    }

    #[tokio::test]
    async fn test_harmful_post_is_rejected_and_not_persisted() {
        let forum = model_forum(r#"{"flagged": true, "categories": ["harassment"]}"#);
        let me = session("me");

        let result = forum.create_post(&me, draft("Hey", "you are all idiots")).await;

        match result {
            Err(ForumError::PolicyViolation { categories }) => {
                assert!(categories.contains("harassment"));
            }
            other => panic!("expected policy violation, got {:?}", other),
        }
        assert!(forum.feed(&me, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_self_harm_post_uses_model_reply() {
        let forum = model_forum(r#"{"flagged": true, "categories": ["self-harm", "violence"]}"#);
        let me = session("me");

        let post = forum.create_post(&me, draft("Help", "everything hurts")).await.unwrap();

        let thread = forum.open_post(&me, post.id).await.unwrap();
        assert_eq!(thread.comments.len(), 1);
        assert_eq!(thread.comments[0].body, "We're here with you.");
    }

    // --- comments ---

    #[tokio::test]
    async fn test_clean_comment_persists_exactly_one_comment() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let post = seeded_post(&forum).await;
        let me = session("me");

        let outcome = forum
            .submit_comment(&me, post.id, "Sending hugs")
            .await
            .unwrap();

        assert!(outcome.automated_reply.is_none());
        assert!(!outcome.comment.is_automated());
        let thread = forum.open_post(&me, post.id).await.unwrap();
        assert_eq!(thread.comments, vec![outcome.comment]);
    }

    #[tokio::test]
    async fn test_text_is_stored_as_typed() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let me = session("me");

        let post = forum
            .create_post(&me, draft("  Spaced title ", "\n body with margins  "))
            .await
            .unwrap();
        let outcome = forum
            .submit_comment(&me, post.id, "  hang in there  ")
            .await
            .unwrap();

        let thread = forum.open_post(&me, post.id).await.unwrap();
        assert_eq!(thread.post.title, "  Spaced title ");
        assert_eq!(thread.post.body, "\n body with margins  ");
        assert_eq!(outcome.comment.body, "  hang in there  ");
        assert_eq!(thread.comments[0].body, "  hang in there  ");
    }

    #[tokio::test]
    async fn test_self_harm_comment_gets_automated_reply() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let post = seeded_post(&forum).await;
        let me = session("me");

        let outcome = forum
            .submit_comment(&me, post.id, "I want to kill myself")
            .await
            .unwrap();

        let reply = outcome.automated_reply.expect("reply expected");
        assert!(reply.is_automated());
        assert_eq!(reply.author.user_id(), None);

        let thread = forum.open_post(&me, post.id).await.unwrap();
        assert_eq!(thread.comments.len(), 2);
        assert_eq!(thread.comments[0].author.user_id(), Some(UserId::from_name("me")));
        assert!(thread.comments[1].is_automated());
    }

    #[tokio::test]
    async fn test_harmful_comment_is_kept_without_reply() {
        let store = InMemoryForumStore::new();
        let author = session("author");
        let post = keyword_forum(store.scoped(ClientOptions::public()))
            .create_post(&author, draft("Hello", "first post"))
            .await
            .unwrap();

        let strict = model_forum(r#"{"flagged": true, "categories": ["harassment"]}"#);
        let forum = ForumService::new(store, strict.moderation, settings());

        let outcome = forum
            .submit_comment(&session("me"), post.id, "you are an idiot")
            .await
            .unwrap();

        assert!(outcome.automated_reply.is_none());
        let thread = forum.open_post(&author, post.id).await.unwrap();
        assert_eq!(thread.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_is_not_found() {
        let forum = keyword_forum(InMemoryForumStore::new());

        assert!(matches!(
            forum.submit_comment(&session("me"), PostId::new(), "hi").await,
            Err(ForumError::NotFound(_))
        ));
    }

    // --- likes ---

    #[tokio::test]
    async fn test_like_then_unlike_round_trip() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let post = seeded_post(&forum).await;
        let me = session("me");

        assert_eq!(forum.toggle_like(&me, post.id).await.unwrap(), LikeState::Liked);
        let thread = forum.open_post(&me, post.id).await.unwrap();
        assert_eq!(thread.post.likes, 1);
        assert_eq!(thread.liked, LikeState::Liked);

        assert_eq!(
            forum.toggle_like(&me, post.id).await.unwrap(),
            LikeState::NotLiked
        );
        let thread = forum.open_post(&me, post.id).await.unwrap();
        assert_eq!(thread.post.likes, 0);
        assert_eq!(thread.liked, LikeState::NotLiked);
        assert!(forum.profile(&me).await.unwrap().liked_post_ids.is_empty());
    }

    /// Reports every like as absent, the way two racing toggles both read
    /// "not liked" before either insert lands.
    struct StaleLikeReads(InMemoryForumStore);

    #[async_trait]
    impl ForumStore for StaleLikeReads {
        fn scoped(&self, options: ClientOptions) -> Self {
            StaleLikeReads(self.0.scoped(options))
        }
        async fn insert_post(&self, post: &Post) -> Result<(), ForumError> {
            self.0.insert_post(post).await
        }
        async fn get_post(&self, id: PostId) -> Result<Option<Post>, ForumError> {
            self.0.get_post(id).await
        }
        async fn list_posts(&self, limit: usize) -> Result<Vec<Post>, ForumError> {
            self.0.list_posts(limit).await
        }
        async fn list_posts_by_author(&self, author: UserId) -> Result<Vec<Post>, ForumError> {
            self.0.list_posts_by_author(author).await
        }
        async fn increment_views(&self, id: PostId) -> Result<(), ForumError> {
            self.0.increment_views(id).await
        }
        async fn insert_comment(&self, comment: &Comment) -> Result<(), ForumError> {
            self.0.insert_comment(comment).await
        }
        async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, ForumError> {
            self.0.list_comments(post_id).await
        }
        async fn insert_like(&self, user: UserId, post_id: PostId) -> Result<LikeInsert, ForumError> {
            self.0.insert_like(user, post_id).await
        }
        async fn delete_like(&self, user: UserId, post_id: PostId) -> Result<bool, ForumError> {
            self.0.delete_like(user, post_id).await
        }
        async fn has_like(&self, _user: UserId, _post_id: PostId) -> Result<bool, ForumError> {
            Ok(false)
        }
        async fn liked_post_ids(&self, user: UserId) -> Result<Vec<PostId>, ForumError> {
            self.0.liked_post_ids(user).await
        }
        async fn count_likes(&self, post_id: PostId) -> Result<i64, ForumError> {
            self.0.count_likes(post_id).await
        }
        async fn increment_likes(&self, post_id: PostId) -> Result<(), ForumError> {
            self.0.increment_likes(post_id).await
        }
        async fn decrement_likes(&self, post_id: PostId) -> Result<(), ForumError> {
            self.0.decrement_likes(post_id).await
        }
        async fn like_count(&self, post_id: PostId) -> Result<Option<i64>, ForumError> {
            self.0.like_count(post_id).await
        }
        async fn set_like_count(&self, post_id: PostId, count: i64) -> Result<(), ForumError> {
            self.0.set_like_count(post_id, count).await
        }
        async fn insert_report(&self, report: &Report) -> Result<(), ForumError> {
            self.0.insert_report(report).await
        }
        async fn reports_for_post(&self, post_id: PostId) -> Result<Vec<Report>, ForumError> {
            self.0.reports_for_post(post_id).await
        }
    }

    #[tokio::test]
    async fn test_racing_likes_create_one_row_and_one_increment() {
        let store = InMemoryForumStore::new();
        let post = keyword_forum(store.scoped(ClientOptions::public()))
            .create_post(&session("author"), draft("Rough week", "Work has been a lot"))
            .await
            .unwrap();
        let forum: ForumService<StaleLikeReads, FixedModel> = ForumService::new(
            StaleLikeReads(store.scoped(ClientOptions::public())),
            ModerationService::keyword_only(),
            settings(),
        );
        let me = session("me");

        let (a, b) = tokio::join!(forum.toggle_like(&me, post.id), forum.toggle_like(&me, post.id));

        assert_eq!(a.unwrap(), LikeState::Liked);
        assert_eq!(b.unwrap(), LikeState::Liked);
        let admin = store.scoped(ClientOptions::elevated());
        assert_eq!(admin.count_likes(post.id).await.unwrap(), 1);
        assert_eq!(admin.like_count(post.id).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_counter_falls_back_without_procedures() {
        let forum = keyword_forum(InMemoryForumStore::new().without_counter_procedures());
        let post = seeded_post(&forum).await;

        for name in ["a", "b", "c"] {
            forum.toggle_like(&session(name), post.id).await.unwrap();
        }
        forum.toggle_like(&session("b"), post.id).await.unwrap();

        let thread = forum.open_post(&session("a"), post.id).await.unwrap();
        assert_eq!(thread.post.likes, 2);
    }

    #[tokio::test]
    async fn test_like_missing_post_is_not_found() {
        let forum = keyword_forum(InMemoryForumStore::new());

        assert!(matches!(
            forum.toggle_like(&session("me"), PostId::new()).await,
            Err(ForumError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reconcile_repairs_drift() {
        let store = InMemoryForumStore::new();
        let forum = keyword_forum(store.scoped(ClientOptions::public()));
        let post = seeded_post(&forum).await;
        forum.toggle_like(&session("me"), post.id).await.unwrap();

        store
            .scoped(ClientOptions::elevated())
            .set_like_count(post.id, 7)
            .await
            .unwrap();

        assert!(matches!(
            forum.reconcile_like_count(&session("me"), post.id).await,
            Err(ForumError::Forbidden(_))
        ));
        let fixed = forum
            .reconcile_like_count(&session("operator"), post.id)
            .await
            .unwrap();
        assert_eq!(fixed, 1);
        let thread = forum.open_post(&session("me"), post.id).await.unwrap();
        assert_eq!(thread.post.likes, 1);
    }

    // --- reports & reads ---

    #[tokio::test]
    async fn test_report_is_pending_and_visible_to_operators() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let post = seeded_post(&forum).await;

        let report = forum
            .submit_report(&session("me"), post.id, "  looks like spam ")
            .await
            .unwrap();
        assert_eq!(report.status, crate::core::forum::ReportStatus::Pending);
        assert_eq!(report.reason, "  looks like spam ");

        assert!(forum.reports_for_post(&session("me"), post.id).await.is_err());
        let reports = forum
            .reports_for_post(&session("operator"), post.id)
            .await
            .unwrap();
        assert_eq!(reports, vec![report]);
    }

    #[tokio::test]
    async fn test_open_post_counts_views() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let post = seeded_post(&forum).await;
        let me = session("me");

        forum.open_post(&me, post.id).await.unwrap();
        let thread = forum.open_post(&me, post.id).await.unwrap();
        assert_eq!(thread.post.views, 2);
    }

    #[tokio::test]
    async fn test_profile_lists_own_posts_and_likes() {
        let forum = keyword_forum(InMemoryForumStore::new());
        let other = seeded_post(&forum).await;
        let me = session("me");
        let mine = forum
            .create_post(&me, draft("Small win", "Got out of bed today"))
            .await
            .unwrap();
        forum.toggle_like(&me, other.id).await.unwrap();

        let profile = forum.profile(&me).await.unwrap();
        assert_eq!(profile.posts, vec![mine]);
        assert_eq!(profile.liked_post_ids, vec![other.id]);
    }
}
