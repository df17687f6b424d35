//! Auth session controller. [`AuthSession`] is the only writer of
//! [`SessionState`]; everything else observes it through `watch` receivers.
//!
//! Flow Overview: `restore` runs once at startup and settles the boot state,
//! `login` and `logout` move between signed in and signed out, and the
//! [`ApiClient`] reports rejected credentials back through the shared core,
//! which clears the store and navigates to the login screen.
//!
//! Stale responses: every committed transition bumps a generation counter.
//! `login` and `restore` remember the generation they started from and drop
//! their result if the session moved on in the meantime (for example a logout
//! while a slow login was in flight), so a late `save` never resurrects a
//! cleared session.

use crate::{
    api::{ApiClient, ApiError, CredentialSource, UnauthorizedHandler},
    api::errors::DEFAULT_ERROR_MESSAGE,
    config::AppConfig,
    routes::{navigation::Navigator, Route},
    session::{
        state::SessionState,
        store::{SessionStore, StoreError},
        types::{Credential, LoginCredentials, LoginGrant, UserProfile},
    },
};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Shown when a login fails without a server message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("session changed while the request was in flight")]
    Superseded,
}

impl AuthError {
    /// User-facing text, the same string recorded as `last_error`.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api(err) => login_failure_message(err),
            other => other.to_string(),
        }
    }
}

/// When a transition may be applied.
#[derive(Clone, Copy, Debug)]
enum Commit {
    /// Only if nothing was committed since `observed`.
    IfCurrent(u64),
    /// Like `IfCurrent`, but also whenever nobody is signed in.
    IfCurrentOrSignedOut(u64),
}

/// State shared between the controller and the HTTP client hooks.
struct SessionCore {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
    generation: Mutex<u64>,
}

impl SessionCore {
    fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    /// Applies `apply` unconditionally and publishes the resulting state.
    fn force<T>(&self, apply: impl FnOnce(&dyn SessionStore) -> (SessionState, T)) -> T {
        let mut generation = self.generation.lock();
        *generation += 1;
        let (next, out) = apply(self.store.as_ref());
        self.publish(next);
        out
    }

    /// Applies `apply` if `rule` still holds; `None` means the result was stale.
    fn commit<T>(
        &self,
        rule: Commit,
        apply: impl FnOnce(&dyn SessionStore) -> (SessionState, T),
    ) -> Option<T> {
        let mut generation = self.generation.lock();
        let allowed = match rule {
            Commit::IfCurrent(observed) => *generation == observed,
            Commit::IfCurrentOrSignedOut(observed) => {
                *generation == observed || !self.state.borrow().is_authenticated()
            }
        };
        if !allowed {
            return None;
        }
        *generation += 1;
        let (next, out) = apply(self.store.as_ref());
        self.publish(next);
        Some(out)
    }

    fn publish(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                debug!(from = %current.status(), to = %next.status(), "session transition");
                *current = next;
                true
            }
        });
    }

    /// Drops the session after the server rejected the credential.
    fn teardown(&self) {
        let mut generation = self.generation.lock();

        if let Err(e) = self.store.clear() {
            error!("failed to clear session store: {e}");
        }

        let signed_out = {
            let state = self.state.borrow();
            !state.is_authenticated() && !state.is_restoring()
        };
        if signed_out {
            return;
        }

        *generation += 1;
        self.publish(SessionState::unauthenticated(None));
        info!("session ended by the server");
    }
}

impl CredentialSource for SessionCore {
    fn credential(&self) -> Option<Credential> {
        match self.store.load() {
            Ok(stored) => stored.credential,
            Err(e) => {
                warn!("failed to read credential, sending request unauthenticated: {e}");
                None
            }
        }
    }
}

impl UnauthorizedHandler for SessionCore {
    fn on_unauthorized(&self) {
        self.teardown();
        self.navigator.navigate(Route::Login);
    }
}

/// Owned session controller. Cloning shares the same session.
#[derive(Clone)]
pub struct AuthSession {
    core: Arc<SessionCore>,
    api: ApiClient,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &*self.core.state.borrow())
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Wires the store and navigator into a fresh controller and its client.
    /// The session starts out `restoring`; call [`AuthSession::restore`] once.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let (state, _) = watch::channel(SessionState::restoring());
        let core = Arc::new(SessionCore {
            store,
            navigator,
            state,
            generation: Mutex::new(0),
        });

        let api = ApiClient::new(
            config,
            Arc::clone(&core) as Arc<dyn CredentialSource>,
            Arc::clone(&core) as Arc<dyn UnauthorizedHandler>,
        )?;

        Ok(Self { core, api })
    }

    /// Client bound to this session, for every other backend call.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.core.state.borrow().clone()
    }

    /// Receiver that wakes on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.core.state.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.core.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.core.state.borrow().is_admin()
    }

    #[must_use]
    pub fn is_military(&self) -> bool {
        self.core.state.borrow().is_military()
    }

    /// Settles the boot state. Without a stored credential no request is
    /// made. With one, only the server's `GET /auth/me` answer is trusted and
    /// it replaces the cached profile.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> SessionState {
        let observed = self.core.generation();

        let stored = match self.core.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                error!("failed to read session store: {e}");
                let message = e.to_string();
                self.core.commit(Commit::IfCurrent(observed), |store| {
                    let _ = store.clear();
                    (SessionState::unauthenticated(Some(message)), ())
                });
                return self.state();
            }
        };

        let Some(credential) = stored.credential else {
            debug!("no stored credential");
            self.core.commit(Commit::IfCurrent(observed), |store| {
                let _ = store.clear();
                (SessionState::unauthenticated(None), ())
            });
            return self.state();
        };

        match self.api.me().await {
            Ok(profile) => {
                let applied = self.core.commit(Commit::IfCurrent(observed), |store| {
                    if let Err(e) = store.save(&credential, &profile) {
                        warn!("failed to refresh cached profile: {e}");
                    }
                    (SessionState::authenticated(profile), ())
                });
                if applied.is_some() {
                    info!("session restored");
                }
            }
            Err(err) => {
                warn!("session restore failed: {err}");
                let last_error = (!err.is_unauthorized()).then(|| err.message().to_string());
                self.core.commit(Commit::IfCurrent(observed), |store| {
                    if let Err(e) = store.clear() {
                        error!("failed to clear session store: {e}");
                    }
                    (SessionState::unauthenticated(last_error), ())
                });
            }
        }

        self.state()
    }

    /// Signs in and persists the new credential and profile together.
    ///
    /// # Errors
    /// - [`AuthError::Api`] when the server rejects the login or is unreachable;
    ///   the message is also recorded as `last_error`.
    /// - [`AuthError::Store`] when the session cannot be persisted.
    /// - [`AuthError::Superseded`] when a logout or another login landed first.
    #[instrument(skip_all)]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<UserProfile, AuthError> {
        let observed = self.core.generation();

        let grant = match self.api.login(credentials).await {
            Ok(grant) if !grant.token.is_empty() => grant,
            Ok(_) => {
                let err = ApiError::Parse("Login response did not include a token".to_string());
                return Err(self.fail_login(observed, err));
            }
            Err(err) => return Err(self.fail_login(observed, err)),
        };

        let LoginGrant {
            token: credential,
            user: profile,
        } = grant;

        let outcome = self
            .core
            .commit(Commit::IfCurrent(observed), |store| {
                match store.save(&credential, &profile) {
                    Ok(()) => (
                        SessionState::authenticated(profile.clone()),
                        Ok(profile.clone()),
                    ),
                    Err(e) => {
                        let _ = store.clear();
                        (
                            SessionState::unauthenticated(Some(e.to_string())),
                            Err(AuthError::Store(e)),
                        )
                    }
                }
            })
            .unwrap_or(Err(AuthError::Superseded));

        match &outcome {
            Ok(profile) => info!(user = %profile.username, role = %profile.role, "signed in"),
            Err(AuthError::Superseded) => warn!("discarding login response, session changed"),
            Err(e) => error!("failed to persist session: {e}"),
        }

        outcome
    }

    fn fail_login(&self, observed: u64, err: ApiError) -> AuthError {
        let message = login_failure_message(&err);
        warn!("login failed: {message}");

        self.core
            .commit(Commit::IfCurrentOrSignedOut(observed), |store| {
                let _ = store.clear();
                (SessionState::unauthenticated(Some(message)), ())
            });

        AuthError::Api(err)
    }

    /// Local sign out; the token is not revoked server-side.
    ///
    /// # Errors
    /// Returns an error if the store cannot be cleared. The state is signed
    /// out either way.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), AuthError> {
        let cleared = self
            .core
            .force(|store| (SessionState::unauthenticated(None), store.clear()));
        info!("signed out");
        cleared.map_err(AuthError::from)
    }

    /// Replaces the profile of the signed in user without a state change.
    /// Ignored when nobody is signed in.
    ///
    /// # Errors
    /// Returns an error if the updated profile cannot be persisted.
    #[instrument(skip_all)]
    pub fn update_profile(&self, profile: UserProfile) -> Result<(), AuthError> {
        let _generation = self.core.generation.lock();

        if !self.core.state.borrow().is_authenticated() {
            warn!("profile update ignored, no authenticated session");
            return Ok(());
        }

        // Persist first; the live state only changes once the record did.
        if let Some(credential) = self.core.store.load()?.credential {
            self.core.store.save(&credential, &profile)?;
        }

        self.core
            .state
            .send_if_modified(|state| state.replace_profile(profile));

        Ok(())
    }

    pub fn clear_error(&self) {
        self.core.state.send_if_modified(|state| {
            if state.last_error().is_some() {
                state.set_error(None);
                true
            } else {
                false
            }
        });
    }
}

/// Server text when there is one, a generic message otherwise.
fn login_failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized { message } | ApiError::Http { message, .. }
            if message != DEFAULT_ERROR_MESSAGE =>
        {
            message.clone()
        }
        ApiError::Unauthorized { .. } | ApiError::Http { .. } | ApiError::Parse(_) => {
            LOGIN_FAILED_MESSAGE.to_string()
        }
        other => other.message().to_string(),
    }
}
