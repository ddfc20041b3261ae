// Request-scoped identity and store access options.
//
// Every action receives a `Session` from the caller. Store handles are built
// per call from `ClientOptions`, never shared between requests.

use super::forum_models::UserId;
use super::forum_store::ForumError;

/// The identity attached to one user action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<UserId>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    pub fn require_user(&self) -> Result<UserId, ForumError> {
        self.user.ok_or(ForumError::Unauthorized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Row-level rules apply: writes only as the credentialed user.
    User,
    /// Bypasses row-level rules. Used for automated replies and counter repair.
    Elevated,
}

/// Options a store handle is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub credentials: Option<UserId>,
    pub privilege: Privilege,
}

impl ClientOptions {
    pub fn for_user(user: UserId) -> Self {
        Self {
            credentials: Some(user),
            privilege: Privilege::User,
        }
    }

    pub fn elevated() -> Self {
        Self {
            credentials: None,
            privilege: Privilege::Elevated,
        }
    }

    /// A handle with no credentials and no privilege; it can only read.
    pub fn public() -> Self {
        Self {
            credentials: None,
            privilege: Privilege::User,
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.privilege == Privilege::Elevated
    }

    /// Allow a write to a row owned by `owner`.
    pub fn authorize_write(&self, owner: UserId) -> Result<(), ForumError> {
        if self.is_elevated() || self.credentials == Some(owner) {
            Ok(())
        } else {
            Err(ForumError::Forbidden(format!(
                "cannot write rows owned by {}",
                owner
            )))
        }
    }

    /// Allow an action that needs any signed-in user.
    pub fn authorize_any_user(&self) -> Result<(), ForumError> {
        if self.is_elevated() || self.credentials.is_some() {
            Ok(())
        } else {
            Err(ForumError::Forbidden("no credentials".to_string()))
        }
    }

    pub fn require_elevated(&self, action: &str) -> Result<(), ForumError> {
        if self.is_elevated() {
            Ok(())
        } else {
            Err(ForumError::Forbidden(format!(
                "{} requires elevated privileges",
                action
            )))
        }
    }
}
