//! The session state machine.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::error::ApiError;
use crate::api::models::{Credentials, Registration, User};
use crate::api::ApiClient;
use crate::observability::metrics;
use crate::session::state::{SessionEvent, SessionSnapshot, SessionState};
use crate::session::store::TokenStore;

/// Result of a user-facing auth operation. Never an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome<T> {
    Success { data: T },
    Failure { error: ApiError },
}

impl<T> AuthOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            AuthOutcome::Success { data } => Some(data),
            AuthOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            AuthOutcome::Success { .. } => None,
            AuthOutcome::Failure { error } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            AuthOutcome::Success { data } => Ok(data),
            AuthOutcome::Failure { error } => Err(error),
        }
    }
}

impl<T> From<Result<T, ApiError>> for AuthOutcome<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => AuthOutcome::Success { data },
            Err(error) => AuthOutcome::Failure { error },
        }
    }
}

/// Client session: current token, identity and loading flag.
///
/// Readers call [`Session::snapshot`] and never block. `restore`, `login`
/// and `register` run one at a time; `logout` applies immediately.
#[derive(Debug)]
pub struct Session {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    snapshot: ArcSwap<SessionSnapshot>,
    mutation: Mutex<()>,
}

impl Session {
    /// Start a session from whatever token `store` holds.
    ///
    /// With a persisted token the session starts in `Restoring`; call
    /// [`Session::restore`] to confirm it.
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        let token = match store.load() {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted token, starting signed out");
                None
            }
        };

        let initial = match token {
            Some(token) => SessionSnapshot::restoring(token),
            None => SessionSnapshot::unauthenticated(),
        };
        metrics::record_session_transition(initial.state);
        tracing::debug!(state = %initial.state, "Session created");

        Self {
            api,
            store,
            snapshot: ArcSwap::from_pointee(initial),
            mutation: Mutex::new(()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot.load_full()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot.load().state
    }

    pub fn token(&self) -> Option<String> {
        self.snapshot.load().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.snapshot.load().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot.load().is_authenticated()
    }

    pub fn loading(&self) -> bool {
        self.snapshot.load().loading
    }

    /// Confirm a persisted token by fetching its identity.
    ///
    /// Any failure discards the token. A no-op outside `Restoring`.
    pub async fn restore(&self) -> Arc<SessionSnapshot> {
        let _guard = self.mutation.lock().await;

        let current = self.snapshot.load_full();
        let token = match current.token.clone() {
            Some(token) if current.state == SessionState::Restoring => token,
            _ => return current,
        };

        let fetched = self.api.fetch_current_user(&token).await;

        // A logout while the fetch was in flight wins.
        if self.snapshot.load().token.as_deref() != Some(token.as_str()) {
            tracing::debug!("Session changed during restore, discarding result");
            return self.snapshot.load_full();
        }

        match fetched {
            Ok(user) if user.is_valid() => {
                tracing::info!(username = %user.username, "Session restored");
                self.publish(SessionSnapshot::authenticated(token, user));
            }
            Ok(_) => {
                tracing::warn!("Identity without id, discarding persisted token");
                self.discard_restore();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session restore failed, discarding persisted token");
                self.discard_restore();
            }
        }
        self.snapshot.load_full()
    }

    fn discard_restore(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear persisted token");
        }
        let next = self.snapshot.load().state.on(SessionEvent::RestoreFailed);
        self.publish(SessionSnapshot {
            state: next,
            ..SessionSnapshot::unauthenticated()
        });
    }

    /// Exchange credentials for a token, confirm the identity, persist.
    ///
    /// On failure the stored token and the current session are unchanged.
    pub async fn login(&self, username_or_email: &str, password: &str) -> AuthOutcome<User> {
        let _guard = self.mutation.lock().await;
        self.set_loading(true);

        let credentials = Credentials {
            username: username_or_email.to_string(),
            password: password.to_string(),
        };

        match self.establish(&credentials).await {
            Ok((token, user)) => {
                tracing::info!(username = %user.username, "Logged in");
                self.publish(SessionSnapshot::authenticated(token, user.clone()));
                AuthOutcome::Success { data: user }
            }
            Err(error) => {
                tracing::warn!(username = %username_or_email, error = %error, "Login failed");
                let current = self.snapshot.load_full();
                let failed = current.state.on(SessionEvent::LoginFailed);
                if failed == SessionState::Error {
                    metrics::record_session_transition(failed);
                }
                let settled = failed.settle();
                self.publish(SessionSnapshot {
                    state: settled,
                    loading: settled == SessionState::Restoring,
                    ..(*current).clone()
                });
                AuthOutcome::Failure { error }
            }
        }
    }

    async fn establish(&self, credentials: &Credentials) -> Result<(String, User), ApiError> {
        let issued = self.api.login(credentials).await?;
        let token = issued.access_token.trim().to_string();
        if token.is_empty() {
            return Err(ApiError::Unknown {
                status: None,
                message: "No access token received".to_string(),
            });
        }

        let user = self.api.fetch_current_user(&token).await?;
        if !user.is_valid() {
            return Err(ApiError::Unknown {
                status: None,
                message: "Invalid user data received".to_string(),
            });
        }

        self.store.save(&token).map_err(|e| ApiError::Unknown {
            status: None,
            message: format!("failed to persist session: {e}"),
        })?;
        Ok((token, user))
    }

    /// Create an account. The session itself is left untouched.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AuthOutcome<User> {
        let _guard = self.mutation.lock().await;
        self.set_loading(true);

        let registration = Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let result = self.api.register(&registration).await;
        match &result {
            Ok(user) => tracing::info!(username = %user.username, "Account registered"),
            Err(e) => tracing::warn!(username, error = %e, "Registration failed"),
        }

        let settled = self.snapshot.load().state == SessionState::Restoring;
        self.set_loading(settled);
        result.into()
    }

    /// Forget the token and identity, locally and in storage.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear persisted token");
        }
        let next = self.snapshot.load().state.on(SessionEvent::LoggedOut);
        self.publish(SessionSnapshot {
            state: next,
            ..SessionSnapshot::unauthenticated()
        });
        tracing::info!("Logged out");
    }

    fn set_loading(&self, loading: bool) {
        let current = self.snapshot.load();
        if current.loading != loading {
            self.snapshot.store(Arc::new(current.with_loading(loading)));
        }
    }

    fn publish(&self, next: SessionSnapshot) {
        let previous = self.snapshot.swap(Arc::new(next));
        let now = self.snapshot.load().state;
        if previous.state != now {
            metrics::record_session_transition(now);
            tracing::debug!(from = %previous.state, to = %now, "Session transition");
        }
    }
}
