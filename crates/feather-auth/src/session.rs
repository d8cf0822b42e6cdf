//! Developer-mode session state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// The two externally visible states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Developer mode is closed
    Locked,
    /// A credential was verified within the session timeout
    Authenticated,
}

/// Authoritative session state, owned by the engine.
///
/// Never persisted: every engine starts locked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    authenticated: bool,
    last_auth_time: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl AuthSession {
    /// A locked session with no error.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session is currently open.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// When the last successful authentication happened.
    #[must_use]
    pub fn last_auth_time(&self) -> Option<DateTime<Utc>> {
        self.last_auth_time
    }

    /// Last user-facing failure reason.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the session is older than `timeout` at `now`.
    ///
    /// A clock that moved backwards yields a zero age.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.last_auth_time
            .is_some_and(|at| elapsed(at, now) > timeout)
    }

    /// Time left before expiry at `now`, `None` when locked.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>, timeout: Duration) -> Option<Duration> {
        if !self.authenticated {
            return None;
        }
        self.last_auth_time
            .map(|at| timeout.saturating_sub(elapsed(at, now)))
    }

    /// Copy of the current fields.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            authenticated: self.authenticated,
            last_auth_time: self.last_auth_time,
            last_error: self.last_error.clone(),
        }
    }

    pub(crate) fn mark_authenticated(&mut self, now: DateTime<Utc>) {
        self.authenticated = true;
        self.last_auth_time = Some(now);
        self.last_error = None;
    }

    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub(crate) fn clear(&mut self) {
        self.authenticated = false;
        self.last_auth_time = None;
        self.last_error = None;
    }
}

/// Read-only view of the session at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Whether developer mode is open
    pub authenticated: bool,
    /// When the last successful authentication happened
    pub last_auth_time: Option<DateTime<Utc>>,
    /// Last user-facing failure reason
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// State-machine state for this snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.authenticated {
            SessionState::Authenticated
        } else {
            SessionState::Locked
        }
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}
