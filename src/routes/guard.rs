//! Route guard. A pure decision from session state and access policy; the
//! [`RouteGuard`] wrapper only re-runs it whenever the session changes.
//!
//! This is a UX gate. The API enforces access on its own.

use crate::session::{state::SessionState, types::UserRole};
use std::collections::BTreeSet;
use tokio::sync::watch;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Any signed in user, whatever the role.
    AnyAuthenticated,
    /// Only the listed roles. An empty set admits nobody.
    RequireRoles(BTreeSet<UserRole>),
}

impl AccessPolicy {
    #[must_use]
    pub fn roles(roles: impl IntoIterator<Item = UserRole>) -> Self {
        Self::RequireRoles(roles.into_iter().collect())
    }

    /// Unrecognized roles never match a requirement.
    #[must_use]
    pub fn allows(&self, role: &UserRole) -> bool {
        match self {
            Self::AnyAuthenticated => true,
            Self::RequireRoles(roles) => role.is_recognized() && roles.contains(role),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardDecision {
    /// Boot check still running; show a neutral indicator.
    Wait,
    Render,
    RedirectToLogin,
    /// Known user without the required role.
    RedirectToUnauthorized,
}

#[must_use]
pub fn evaluate(state: &SessionState, policy: &AccessPolicy) -> GuardDecision {
    if state.is_restoring() {
        return GuardDecision::Wait;
    }

    match state.profile() {
        Some(profile) if state.is_authenticated() => {
            if policy.allows(&profile.role) {
                GuardDecision::Render
            } else {
                GuardDecision::RedirectToUnauthorized
            }
        }
        _ => GuardDecision::RedirectToLogin,
    }
}

/// Guard bound to a live session.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    policy: AccessPolicy,
    state: watch::Receiver<SessionState>,
}

impl RouteGuard {
    #[must_use]
    pub const fn new(state: watch::Receiver<SessionState>, policy: AccessPolicy) -> Self {
        Self { policy, state }
    }

    #[must_use]
    pub const fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Decision for the current state.
    #[must_use]
    pub fn decision(&self) -> GuardDecision {
        evaluate(&self.state.borrow(), &self.policy)
    }

    /// Waits for the next session change and returns the new decision.
    /// `None` once the session controller is gone.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        self.state.changed().await.ok()?;
        Some(evaluate(&self.state.borrow_and_update(), &self.policy))
    }

    /// Waits until the boot check is over and returns the first real decision.
    pub async fn settled(&mut self) -> Option<GuardDecision> {
        let state = self
            .state
            .wait_for(|state| !state.is_restoring())
            .await
            .ok()?;
        Some(evaluate(&state, &self.policy))
    }
}
