// Parses one console line into a command. No I/O here.

use crate::core::forum::PostId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { name: String },
    Logout,
    Post { title: String, body: String, tags: String },
    Comment { post_id: PostId, body: String },
    Like { post_id: PostId },
    Report { post_id: PostId, reason: String },
    Feed { limit: Option<usize> },
    Open { post_id: PostId },
    Profile,
    Reconcile { post_id: PostId },
    Reports { post_id: PostId },
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command '{0}'. Type 'help' for the list of commands.")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a valid post id")]
    InvalidPostId(String),
}

pub const HELP: &str = "\
Commands:
  login <name>                       sign in (the same name always maps to the same user)
  logout                             sign out
  post <title> | <body> [| <tags>]   create a post, tags comma-separated
  comment <post-id> <text>           comment on a post
  like <post-id>                     like or unlike a post
  report <post-id> <reason>          report a post
  feed [limit]                       newest posts
  open <post-id>                     show a post and its comments
  profile                            your posts and likes
  reconcile <post-id>                recount a post's likes (operators)
  reports <post-id>                  reports filed against a post (operators)
  help                               this text
  quit                               leave";

/// Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = split_word(line);
    let command = match verb.to_lowercase().as_str() {
        "login" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("login <name>"));
            }
            Command::Login {
                name: rest.to_string(),
            }
        }
        "logout" => Command::Logout,
        "post" => parse_post(rest)?,
        "comment" => {
            let (post_id, body) = post_id_and_text(rest, "comment <post-id> <text>")?;
            Command::Comment { post_id, body }
        }
        "like" => Command::Like {
            post_id: single_post_id(rest, "like <post-id>")?,
        },
        "report" => {
            let (post_id, reason) = post_id_and_text(rest, "report <post-id> <reason>")?;
            Command::Report { post_id, reason }
        }
        "feed" => {
            let limit = if rest.is_empty() {
                None
            } else {
                Some(rest.parse().map_err(|_| ParseError::Usage("feed [limit]"))?)
            };
            Command::Feed { limit }
        }
        "open" => Command::Open {
            post_id: single_post_id(rest, "open <post-id>")?,
        },
        "profile" => Command::Profile,
        "reconcile" => Command::Reconcile {
            post_id: single_post_id(rest, "reconcile <post-id>")?,
        },
        "reports" => Command::Reports {
            post_id: single_post_id(rest, "reports <post-id>")?,
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(ParseError::UnknownCommand(verb.to_string())),
    };

    Ok(Some(command))
}

fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn parse_post(rest: &str) -> Result<Command, ParseError> {
    const USAGE: &str = "post <title> | <body> [| <tags>]";

    let mut fields = rest.splitn(3, '|').map(str::trim);
    let title = fields.next().unwrap_or_default();
    let Some(body) = fields.next() else {
        return Err(ParseError::Usage(USAGE));
    };
    let tags = fields.next().unwrap_or_default();

    // Empty title or body is left to the forum's own validation.
    Ok(Command::Post {
        title: title.to_string(),
        body: body.to_string(),
        tags: tags.to_string(),
    })
}

fn parse_post_id(raw: &str) -> Result<PostId, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::InvalidPostId(raw.to_string()))
}

fn single_post_id(rest: &str, usage: &'static str) -> Result<PostId, ParseError> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(ParseError::Usage(usage));
    }
    parse_post_id(rest)
}

fn post_id_and_text(rest: &str, usage: &'static str) -> Result<(PostId, String), ParseError> {
    let (raw_id, text) = split_word(rest);
    if raw_id.is_empty() || text.is_empty() {
        return Err(ParseError::Usage(usage));
    }
    Ok((parse_post_id(raw_id)?, text.to_string()))
}
