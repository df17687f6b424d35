//! Screens of the gate console and who may see them.
//!
//! Flow Overview: a path maps to a [`Route`], the route carries an optional
//! [`AccessPolicy`] (none means public), and [`resolve`] combines it with the
//! current session into a [`Navigation`] outcome. `/` and `/login` bounce a
//! signed in user to the dashboard.

pub mod guard;
pub mod navigation;

pub use guard::{evaluate, AccessPolicy, GuardDecision, RouteGuard};
pub use navigation::{NavigationState, Navigator};

use crate::session::{state::SessionState, types::UserRole};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    /// Gate kiosk, usable without a session.
    NewTruck,
    Dashboard,
    AdminUsers,
    AdminContractors,
    AdminFactories,
    AdminGates,
    AdminTrucks,
    AdminStatistics,
    Unauthorized,
    NotFound,
}

impl Route {
    pub const ALL: [Self; 12] = [
        Self::Home,
        Self::Login,
        Self::NewTruck,
        Self::Dashboard,
        Self::AdminUsers,
        Self::AdminContractors,
        Self::AdminFactories,
        Self::AdminGates,
        Self::AdminTrucks,
        Self::AdminStatistics,
        Self::Unauthorized,
        Self::NotFound,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::NewTruck => "/new-truck",
            Self::Dashboard => "/dashboard",
            Self::AdminUsers => "/admin/users",
            Self::AdminContractors => "/admin/contractors",
            Self::AdminFactories => "/admin/factories",
            Self::AdminGates => "/admin/gates",
            Self::AdminTrucks => "/admin/trucks",
            Self::AdminStatistics => "/admin/statistics",
            Self::Unauthorized => "/unauthorized",
            Self::NotFound => "*",
        }
    }

    /// Unknown paths map to [`Route::NotFound`]. Query strings, fragments and
    /// a trailing slash are ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        Self::ALL
            .into_iter()
            .find(|route| *route != Self::NotFound && route.path() == path)
            .unwrap_or(Self::NotFound)
    }

    /// `None` for public screens.
    #[must_use]
    pub fn policy(self) -> Option<AccessPolicy> {
        match self {
            Self::Dashboard => Some(AccessPolicy::roles([UserRole::Admin, UserRole::Military])),
            Self::AdminUsers
            | Self::AdminContractors
            | Self::AdminFactories
            | Self::AdminGates
            | Self::AdminTrucks
            | Self::AdminStatistics => Some(AccessPolicy::roles([UserRole::Admin])),
            Self::Home | Self::Login | Self::NewTruck | Self::Unauthorized | Self::NotFound => {
                None
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// Session still restoring.
    Wait,
    Render(Route),
    Redirect(Route),
}

#[must_use]
pub fn resolve(route: Route, state: &SessionState) -> Navigation {
    match route {
        Route::Home if state.is_restoring() => Navigation::Wait,
        Route::Home | Route::Login if state.is_authenticated() => {
            Navigation::Redirect(Route::Dashboard)
        }
        Route::Home => Navigation::Redirect(Route::Login),
        route => match route.policy() {
            None => Navigation::Render(route),
            Some(policy) => match evaluate(state, &policy) {
                GuardDecision::Wait => Navigation::Wait,
                GuardDecision::Render => Navigation::Render(route),
                GuardDecision::RedirectToLogin => Navigation::Redirect(Route::Login),
                GuardDecision::RedirectToUnauthorized => Navigation::Redirect(Route::Unauthorized),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::UserProfile;

    fn signed_in(role: UserRole) -> SessionState {
        SessionState::authenticated(UserProfile {
            id: "u1".to_string(),
            name: "Operator".to_string(),
            username: "operator".to_string(),
            email: None,
            role,
        })
    }

    #[test]
    fn from_path_maps_known_screens() {
        assert_eq!(Route::from_path("/"), Route::Home);
        assert_eq!(Route::from_path(""), Route::Home);
        assert_eq!(Route::from_path("/admin/gates/"), Route::AdminGates);
        assert_eq!(Route::from_path("/admin/trucks?page=2"), Route::AdminTrucks);
        assert_eq!(Route::from_path("/new-truck#form"), Route::NewTruck);
        assert_eq!(Route::from_path("/admin/reports"), Route::NotFound);
        assert_eq!(Route::from_path("*"), Route::NotFound);
    }

    #[test]
    fn public_screens_render_for_everyone() {
        for state in [
            SessionState::restoring(),
            SessionState::unauthenticated(None),
            signed_in(UserRole::Military),
        ] {
            assert_eq!(
                resolve(Route::NewTruck, &state),
                Navigation::Render(Route::NewTruck)
            );
            assert_eq!(
                resolve(Route::NotFound, &state),
                Navigation::Render(Route::NotFound)
            );
        }
    }

    #[test]
    fn login_and_home_bounce_signed_in_users() {
        let admin = signed_in(UserRole::Admin);
        assert_eq!(
            resolve(Route::Login, &admin),
            Navigation::Redirect(Route::Dashboard)
        );
        assert_eq!(
            resolve(Route::Home, &admin),
            Navigation::Redirect(Route::Dashboard)
        );

        let anonymous = SessionState::unauthenticated(None);
        assert_eq!(
            resolve(Route::Login, &anonymous),
            Navigation::Render(Route::Login)
        );
        assert_eq!(
            resolve(Route::Home, &anonymous),
            Navigation::Redirect(Route::Login)
        );
        assert_eq!(resolve(Route::Home, &SessionState::restoring()), Navigation::Wait);
    }

    #[test]
    fn dashboard_admits_both_roles_admin_pages_only_admins() {
        let military = signed_in(UserRole::Military);
        assert_eq!(
            resolve(Route::Dashboard, &military),
            Navigation::Render(Route::Dashboard)
        );
        assert_eq!(
            resolve(Route::AdminStatistics, &military),
            Navigation::Redirect(Route::Unauthorized)
        );
        assert_eq!(
            resolve(Route::AdminUsers, &signed_in(UserRole::Admin)),
            Navigation::Render(Route::AdminUsers)
        );
        assert_eq!(
            resolve(
                Route::Dashboard,
                &signed_in(UserRole::Unrecognized("viewer".to_string()))
            ),
            Navigation::Redirect(Route::Unauthorized)
        );
    }

    #[test]
    fn protected_screens_wait_while_restoring() {
        assert_eq!(
            resolve(Route::AdminGates, &SessionState::restoring()),
            Navigation::Wait
        );
        assert_eq!(
            resolve(Route::AdminGates, &SessionState::unauthenticated(None)),
            Navigation::Redirect(Route::Login)
        );
    }
}
