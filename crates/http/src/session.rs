//! Observable authentication state
//!
//! One [`Session`] is constructed at application bootstrap and handed to
//! everything that cares who is logged in. State changes flow through a
//! watch channel, so consumers either snapshot the current status or await
//! transitions. A listener on the client's event bus clears the user when
//! any request comes back 401, no matter which call site triggered it.

use quizdeck_core::{LoginRequest, RegisterRequest, SessionEvent, User};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::client::error::ClientError;
use crate::client::QuizClient;

/// Authentication lifecycle of the running application
#[derive(Clone, Debug, PartialEq)]
pub enum AuthStatus {
    /// Startup probe has not resolved yet
    Initializing,
    /// A user is logged in
    Authenticated(User),
    /// Nobody is logged in
    Anonymous,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Shared handle to the authentication state
///
/// Must be constructed inside a Tokio runtime; the expiry listener is
/// spawned on it.
#[derive(Clone)]
pub struct Session {
    client: QuizClient,
    state: watch::Sender<AuthStatus>,
}

impl Session {
    pub fn new(client: QuizClient) -> Self {
        let (state, _) = watch::channel(AuthStatus::Initializing);
        let session = Self { client, state };
        session.spawn_expiry_listener();
        session
    }

    /// The client this session authenticates against
    pub fn client(&self) -> &QuizClient {
        &self.client
    }

    /// Watch for state transitions
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.state.subscribe()
    }

    /// Snapshot of the current status
    pub fn status(&self) -> AuthStatus {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Startup probe: resolve [`AuthStatus::Initializing`] by asking the
    /// backend who the session belongs to. Any failure, transport included,
    /// leaves the session anonymous.
    pub async fn initialize(&self) {
        self.probe().await;
    }

    /// Re-run the session probe on demand
    pub async fn check_status(&self) {
        self.probe().await;
    }

    async fn probe(&self) {
        match self.client.me().await {
            Ok(user) => self.transition(AuthStatus::Authenticated(user)),
            Err(err) => {
                debug!(error = %err, "session probe failed, treating as anonymous");
                self.transition(AuthStatus::Anonymous);
            }
        }
    }

    /// Log in. On success the session becomes authenticated; on failure the
    /// current state is left untouched and the error is surfaced.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User, ClientError> {
        let response = self.client.login(credentials).await?;
        let ok = response.ok;
        let user = response.user.filter(|_| ok).ok_or_else(|| {
            ClientError::AuthenticationFailed("login response carried no user".to_owned())
        })?;
        self.transition(AuthStatus::Authenticated(user.clone()));
        Ok(user)
    }

    /// Register a new account; a successful registration logs the user in
    pub async fn register(&self, registration: &RegisterRequest) -> Result<User, ClientError> {
        let response = self.client.register(registration).await?;
        let ok = response.ok;
        let user = response.user.filter(|_| ok).ok_or_else(|| {
            ClientError::AuthenticationFailed("registration response carried no user".to_owned())
        })?;
        self.transition(AuthStatus::Authenticated(user.clone()));
        Ok(user)
    }

    /// Log out. The local session always ends anonymous, even when the
    /// network call fails; the goal is a logged-out UI state, not a
    /// round-trip guarantee.
    pub async fn logout(&self) {
        if let Err(err) = self.client.logout().await {
            warn!(error = %err, "logout request failed, clearing local session anyway");
        }
        self.client.csrf().clear_token();
        self.transition(AuthStatus::Anonymous);
    }

    /// Apply a transition, notifying watchers only on actual change. This is
    /// what makes redundant expiry signals collapse into one observable
    /// transition.
    fn transition(&self, next: AuthStatus) {
        self.state.send_if_modified(|status| {
            if *status == next {
                return false;
            }
            *status = next.clone();
            true
        });
    }

    fn spawn_expiry_listener(&self) {
        let mut events = self.client.events().subscribe();
        let state = self.state.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired) => {
                        let changed = state.send_if_modified(|status| {
                            if *status == AuthStatus::Anonymous {
                                return false;
                            }
                            *status = AuthStatus::Anonymous;
                            true
                        });
                        if changed {
                            debug!("session expired, cleared current user");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session event receiver lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}
