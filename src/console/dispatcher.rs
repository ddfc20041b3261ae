// Reads commands line by line, runs them against the forum service and
// writes the result. Errors are printed; only `quit` or end of input stops
// the loop.

use super::command_parser::{parse, Command, HELP};
use super::formatter;
use crate::core::ai::AiProvider;
use crate::core::forum::{ForumService, ForumStore, LikeState, PostDraft, Session, UserId};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Services shared by every console command.
pub struct Data<S: ForumStore, P: AiProvider> {
    pub forum: Arc<ForumService<S, P>>,
}

impl<S: ForumStore, P: AiProvider> Clone for Data<S, P> {
    fn clone(&self) -> Self {
        Self {
            forum: Arc::clone(&self.forum),
        }
    }
}

/// Who is signed in at this console.
#[derive(Debug, Default)]
struct ConsoleState {
    session: Session,
    name: Option<String>,
}

enum Flow {
    Continue,
    Quit,
}

pub async fn run<S, P, R, W>(data: Data<S, P>, input: R, mut output: W) -> Result<(), Error>
where
    S: ForumStore,
    P: AiProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut state = ConsoleState::default();
    let mut lines = input.lines();

    write_line(&mut output, "Welcome to Safe House. Type 'help' to get started.").await?;

    while let Some(line) = lines.next_line().await? {
        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                write_line(&mut output, &e.to_string()).await?;
                continue;
            }
        };

        let (text, flow) = dispatch(&data, &mut state, command).await;
        write_line(&mut output, &text).await?;
        if let Flow::Quit = flow {
            break;
        }
    }

    output.flush().await?;
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), Error> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    Ok(())
}

async fn dispatch<S: ForumStore, P: AiProvider>(
    data: &Data<S, P>,
    state: &mut ConsoleState,
    command: Command,
) -> (String, Flow) {
    let forum = &data.forum;
    let session = state.session;
    let viewer = session.user();

    let result = match command {
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => return ("Take care. Goodbye.".to_string(), Flow::Quit),
        Command::Login { name } => {
            let user = UserId::from_name(&name);
            state.session = Session::authenticated(user);
            tracing::info!(user_id = %user, "Console login");
            let text = format!("Logged in as {}.", name);
            state.name = Some(name);
            Ok(text)
        }
        Command::Logout => {
            let text = match state.name.take() {
                Some(name) => format!("Logged out {}.", name),
                None => "You were not logged in.".to_string(),
            };
            state.session = Session::anonymous();
            Ok(text)
        }
        Command::Post { title, body, tags } => forum
            .create_post(&session, PostDraft { title, body, tags })
            .await
            .map(|post| format!("Post {} published.", post.id)),
        Command::Comment { post_id, body } => forum
            .submit_comment(&session, post_id, &body)
            .await
            .map(|outcome| formatter::format_comment_outcome(&outcome)),
        Command::Like { post_id } => {
            forum
                .toggle_like(&session, post_id)
                .await
                .map(|like| match like {
                    LikeState::Liked => "Liked.".to_string(),
                    LikeState::NotLiked => "Like removed.".to_string(),
                })
        }
        Command::Report { post_id, reason } => forum
            .submit_report(&session, post_id, &reason)
            .await
            .map(|_| "Thanks. Our team will review this post.".to_string()),
        Command::Feed { limit } => forum
            .feed(&session, limit)
            .await
            .map(|posts| formatter::format_feed(&posts, viewer)),
        Command::Open { post_id } => forum
            .open_post(&session, post_id)
            .await
            .map(|thread| formatter::format_thread(&thread, viewer)),
        Command::Profile => forum
            .profile(&session)
            .await
            .map(|profile| formatter::format_profile(&profile)),
        Command::Reconcile { post_id } => forum
            .reconcile_like_count(&session, post_id)
            .await
            .map(|count| format!("Like counter set to {}.", count)),
        Command::Reports { post_id } => forum
            .reports_for_post(&session, post_id)
            .await
            .map(|reports| formatter::format_reports(&reports)),
    };

    let text = result.unwrap_or_else(|e| {
        tracing::debug!("Console command failed: {}", e);
        formatter::format_error(&e)
    });
    (text, Flow::Continue)
}
