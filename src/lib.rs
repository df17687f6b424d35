//! # Truckgate (Gate Session Client)
//!
//! `truckgate` is the client side of the factory gate truck tracking system. It
//! owns the operator session: the bearer credential issued at login, the cached
//! user profile, and the decision whether a screen may be shown.
//!
//! ## Session Lifecycle
//!
//! 1. **Restore:** On startup the [`session::AuthSession`] reads the stored
//!    credential. Without one it settles as unauthenticated without touching the
//!    network; with one it asks `GET /auth/me` and trusts only the server answer.
//! 2. **Login:** `POST auth/login` returns a fresh token and profile, which are
//!    persisted together through a [`session::SessionStore`].
//! 3. **Teardown:** Any `401` seen by the [`api::ApiClient`] clears the store and
//!    sends the operator back to the login screen, whatever the caller does with
//!    the returned error.
//!
//! ## Authorization
//!
//! Screens are gated by [`routes::AccessPolicy`]. Roles are a closed set
//! (`admin`, `military`); an unknown role never satisfies a requirement. The
//! gate is UX only, the API enforces access on its own.

pub mod api;
pub mod cli;
pub mod config;
pub mod routes;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
