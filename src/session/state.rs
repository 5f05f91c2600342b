//! Session states and snapshots.

use std::fmt;

use crate::api::models::User;

/// Lifecycle state of the client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Unauthenticated,
    Restoring,
    Authenticated,
    Error,
}

/// Inputs that drive [`SessionState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    RestoreSucceeded,
    RestoreFailed,
    LoginSucceeded,
    LoginFailed,
    LoggedOut,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Restoring => "restoring",
            SessionState::Authenticated => "authenticated",
            SessionState::Error => "error",
        }
    }

    /// Next state after `event`.
    pub fn on(self, event: SessionEvent) -> SessionState {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (_, LoggedOut) => Unauthenticated,
            (Restoring, RestoreSucceeded) => Authenticated,
            (Restoring, RestoreFailed) => Unauthenticated,
            (_, LoginSucceeded) => Authenticated,
            // A failed re-login keeps the existing session; a failed login
            // during restore leaves the restore pending.
            (Authenticated, LoginFailed) => Authenticated,
            (Restoring, LoginFailed) => Restoring,
            (_, LoginFailed) => Error,
            (state, _) => state,
        }
    }

    /// Collapse transient states.
    pub fn settle(self) -> SessionState {
        match self {
            SessionState::Error => SessionState::Unauthenticated,
            other => other,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable view of the session handed to readers.
///
/// `user` is only set together with `token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub token: Option<String>,
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn unauthenticated() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            token: None,
            user: None,
            loading: false,
        }
    }

    pub fn restoring(token: String) -> Self {
        Self {
            state: SessionState::Restoring,
            token: Some(token),
            user: None,
            loading: true,
        }
    }

    pub fn authenticated(token: String, user: User) -> Self {
        Self {
            state: SessionState::Authenticated,
            token: Some(token),
            user: Some(user),
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn with_loading(&self, loading: bool) -> Self {
        Self {
            loading,
            ..self.clone()
        }
    }
}
