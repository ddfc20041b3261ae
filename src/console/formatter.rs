use crate::core::forum::{
    Comment, CommentAuthor, CommentOutcome, ForumError, LikeState, Post, PostThread, Profile,
    Report, UserId,
};

const SUPPORT_BADGE: &str = "Safe House team";

/// First block of a UUID. Enough to tell authors apart on screen.
fn short_id(user: UserId) -> String {
    user.to_string().chars().take(8).collect()
}

fn author_label(author: UserId, viewer: Option<UserId>) -> String {
    if Some(author) == viewer {
        "you".to_string()
    } else {
        format!("user {}", short_id(author))
    }
}

pub fn format_post_line(post: &Post, viewer: Option<UserId>) -> String {
    let mut line = format!(
        "{}  {}  by {}  ({} likes, {} views)",
        post.id,
        post.title,
        author_label(post.author, viewer),
        post.likes,
        post.views
    );
    if !post.tags.is_empty() {
        line.push_str(&format!("  [{}]", post.tags.join(", ")));
    }
    line
}

pub fn format_feed(posts: &[Post], viewer: Option<UserId>) -> String {
    if posts.is_empty() {
        return "No posts yet. Be the first to share something.".to_string();
    }
    posts
        .iter()
        .map(|p| format_post_line(p, viewer))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_comment(comment: &Comment, viewer: Option<UserId>) -> String {
    let who = match comment.author {
        CommentAuthor::User(user) => author_label(user, viewer),
        CommentAuthor::System => SUPPORT_BADGE.to_string(),
    };
    format!(
        "  - {} ({}): {}",
        who,
        comment.created_at.format("%Y-%m-%d %H:%M"),
        comment.body
    )
}

pub fn format_thread(thread: &PostThread, viewer: Option<UserId>) -> String {
    let post = &thread.post;
    let mut out = vec![
        format_post_line(post, viewer),
        format!("Posted {}", post.created_at.format("%Y-%m-%d %H:%M UTC")),
        String::new(),
        post.body.clone(),
        String::new(),
    ];

    if thread.liked == LikeState::Liked {
        out.push("You like this post.".to_string());
    }

    if thread.comments.is_empty() {
        out.push("No comments yet.".to_string());
    } else {
        out.push(format!("Comments ({}):", thread.comments.len()));
        out.extend(thread.comments.iter().map(|c| format_comment(c, viewer)));
    }
    out.join("\n")
}

pub fn format_comment_outcome(outcome: &CommentOutcome) -> String {
    let mut out = format!("Comment {} added.", outcome.comment.id);
    if let Some(reply) = &outcome.automated_reply {
        out.push_str(&format!("\n{}: {}", SUPPORT_BADGE, reply.body));
    }
    out
}

pub fn format_profile(profile: &Profile) -> String {
    let viewer = Some(profile.user);
    let mut out = vec![format!("Profile of user {}", short_id(profile.user))];

    out.push(format!("Your posts ({}):", profile.posts.len()));
    out.extend(
        profile
            .posts
            .iter()
            .map(|p| format!("  {}", format_post_line(p, viewer))),
    );

    out.push(format!("Liked posts ({}):", profile.liked_post_ids.len()));
    out.extend(profile.liked_post_ids.iter().map(|id| format!("  {}", id)));
    out.join("\n")
}

pub fn format_reports(reports: &[Report]) -> String {
    if reports.is_empty() {
        return "No reports for this post.".to_string();
    }
    reports
        .iter()
        .map(|r| {
            format!(
                "{}  [{}]  by user {} at {}: {}",
                r.id,
                r.status,
                short_id(r.reporter),
                r.created_at.format("%Y-%m-%d %H:%M"),
                r.reason
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_error(error: &ForumError) -> String {
    match error {
        ForumError::Unauthorized => "Please log in first: login <name>".to_string(),
        ForumError::PolicyViolation { .. } => {
            "Your post was not published because it goes against our community guidelines."
                .to_string()
        }
        ForumError::Validation(msg) => msg.clone(),
        other => format!("Error: {}", other),
    }
}
