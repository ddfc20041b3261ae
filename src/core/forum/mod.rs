// Forum module - posts, comments, likes and reports.

pub mod forum_models;
pub mod forum_service;
pub mod forum_store;
pub mod session;

pub use forum_models::*;
pub use forum_service::{ForumService, ForumSettings};
pub use forum_store::{ForumError, ForumStore};
pub use session::{ClientOptions, Session};
