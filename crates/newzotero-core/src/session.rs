//! User session context.
//!
//! A session is nothing more than the username that scopes every backend
//! call. It is created on login, handed to the remote store and controller at
//! construction, and cleared on logout.

use std::fmt;

use crate::error::{Error, Result};

/// The signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
}

impl Session {
    /// Start a session for `username` (surrounding whitespace is ignored).
    pub fn login(username: &str) -> Result<Self> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("Username must not be empty".to_string()));
        }
        Ok(Self {
            username: username.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("username", &self.username)
            .finish()
    }
}

/// Where the username survives between runs.
pub trait SessionStore {
    fn load_session(&self) -> Result<Option<Session>>;
    fn save_session(&self, session: &Session) -> Result<()>;
    fn clear_session(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_trims_username() {
        let session = Session::login("  zuxxofEN01 ").unwrap();
        assert_eq!(session.username(), "zuxxofEN01");
    }

    #[test]
    fn login_rejects_blank_username() {
        let err = Session::login("   ").unwrap_err();
        assert!(err.is_validation());
    }
}
