//! Derived view of the current session. Only the controller creates new
//! states; the constructors make `authenticated` and "has a profile" the same
//! thing.

use crate::session::types::{UserProfile, UserRole};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Boot check in flight. Never re-entered once left.
    Restoring,
    Authenticated,
    Unauthenticated,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Restoring => "restoring",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    profile: Option<UserProfile>,
    status: SessionStatus,
    last_error: Option<String>,
}

impl SessionState {
    #[must_use]
    pub const fn restoring() -> Self {
        Self {
            profile: None,
            status: SessionStatus::Restoring,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn authenticated(profile: UserProfile) -> Self {
        Self {
            profile: Some(profile),
            status: SessionStatus::Authenticated,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn unauthenticated(last_error: Option<String>) -> Self {
        Self {
            profile: None,
            status: SessionStatus::Unauthenticated,
            last_error,
        }
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Option<&UserRole> {
        self.profile.as_ref().map(|profile| &profile.role)
    }

    #[must_use]
    pub const fn is_restoring(&self) -> bool {
        matches!(self.status, SessionStatus::Restoring)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.status, SessionStatus::Authenticated)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Some(&UserRole::Admin)
    }

    #[must_use]
    pub fn is_military(&self) -> bool {
        self.role() == Some(&UserRole::Military)
    }

    pub(crate) fn set_error(&mut self, message: Option<String>) {
        self.last_error = message;
    }

    /// Swaps the profile of an authenticated state; other states are left alone.
    pub(crate) fn replace_profile(&mut self, profile: UserProfile) -> bool {
        if self.is_authenticated() {
            self.profile = Some(profile);
            true
        } else {
            false
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::restoring()
    }
}
