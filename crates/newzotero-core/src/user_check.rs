//! Login-time check of whether a username already has a library.
//!
//! Checks can overlap while the user is still typing. Each check takes a
//! ticket from [`UserCheckTracker::begin`]; only the result of the latest
//! ticket is applied, so a slow answer for an older username never
//! overwrites the status of a newer one.

use crate::error::Result;

/// What the login screen shows for the entered username.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserCheckStatus {
    #[default]
    Blank,
    Checking,
    Existing,
    New,
    Failed,
}

impl UserCheckStatus {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Blank => "Enter an ID; an unused ID creates a new library",
            Self::Checking => "Checking ID...",
            Self::Existing => "Welcome back, your library was found",
            Self::New => "This ID is new; a fresh library will be created",
            Self::Failed => "Could not check this ID right now",
        }
    }
}

/// Handle for one in-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    generation: u64,
    username: String,
}

impl CheckTicket {
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, Default)]
pub struct UserCheckTracker {
    generation: u64,
    status: UserCheckStatus,
}

impl UserCheckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn status(&self) -> UserCheckStatus {
        self.status
    }

    /// Start checking `username`. Any older ticket becomes stale.
    ///
    /// Returns `None` for a blank username; nothing needs to be sent.
    pub fn begin(&mut self, username: &str) -> Option<CheckTicket> {
        self.generation += 1;
        let username = username.trim();
        if username.is_empty() {
            self.status = UserCheckStatus::Blank;
            return None;
        }
        self.status = UserCheckStatus::Checking;
        Some(CheckTicket {
            generation: self.generation,
            username: username.to_string(),
        })
    }

    /// Apply the result of a check. Returns `false` if the ticket is stale
    /// and the result was dropped.
    pub fn resolve(&mut self, ticket: &CheckTicket, result: &Result<bool>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(username = %ticket.username, "Ignoring stale user check");
            return false;
        }
        self.status = match result {
            Ok(true) => UserCheckStatus::Existing,
            Ok(false) => UserCheckStatus::New,
            Err(err) => {
                tracing::warn!(username = %ticket.username, error = %err, "User check failed");
                UserCheckStatus::Failed
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn late_answer_for_older_username_is_ignored() {
        let mut tracker = UserCheckTracker::new();
        let first = tracker.begin("A").unwrap();
        let second = tracker.begin("B").unwrap();

        assert!(tracker.resolve(&second, &Ok(false)));
        assert_eq!(tracker.status(), UserCheckStatus::New);

        assert!(!tracker.resolve(&first, &Ok(true)));
        assert_eq!(tracker.status(), UserCheckStatus::New);
    }

    #[test]
    fn blank_username_invalidates_pending_checks() {
        let mut tracker = UserCheckTracker::new();
        let pending = tracker.begin("alice").unwrap();
        assert!(tracker.begin("   ").is_none());
        assert_eq!(tracker.status(), UserCheckStatus::Blank);

        assert!(!tracker.resolve(&pending, &Ok(true)));
        assert_eq!(tracker.status(), UserCheckStatus::Blank);
    }

    #[test]
    fn failure_is_reported() {
        let mut tracker = UserCheckTracker::new();
        let ticket = tracker.begin("alice").unwrap();
        assert_eq!(tracker.status(), UserCheckStatus::Checking);
        assert_eq!(ticket.username(), "alice");

        let result = Err(Error::Api {
            status: 500,
            message: "down".to_string(),
        });
        assert!(tracker.resolve(&ticket, &result));
        assert_eq!(tracker.status(), UserCheckStatus::Failed);
    }
}
