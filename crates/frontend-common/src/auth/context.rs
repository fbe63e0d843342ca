//! Session state machine shared by every view
//!
//! State only changes through [`SessionContextData::reduce`]. Pairs of state
//! and action that the table below does not list leave the state unchanged.
//!
//! | From                         | Action          | To                          |
//! |------------------------------|-----------------|-----------------------------|
//! | any but Authenticating       | Restore         | Authenticated or Anonymous  |
//! | Anonymous, Authenticated     | SubmitLogin     | Authenticating              |
//! | Authenticating               | LoginSucceeded  | Authenticated               |
//! | Authenticating               | LoginFailed     | Anonymous                   |
//! | Authenticated                | Unauthorized    | SessionExpired              |
//! | SessionExpired               | Redirect        | Anonymous, at Login         |
//! | any                          | RequireLogin    | Anonymous, at Login         |
//! | any                          | Logout          | Anonymous, at Login         |
//! | any                          | Navigate        | same phase, guarded route   |
//! | any                          | ShowError       | same phase, error recorded  |

use crate::routes::Route;
use tracing::debug;

/// Where the user is in the session lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
    SessionExpired,
}

/// Session context data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContextData {
    pub phase: SessionPhase,
    pub route: Route,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Session context actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Page load: whether a credential was found in the store
    Restore { has_credential: bool },
    SubmitLogin,
    LoginSucceeded,
    LoginFailed(String),
    /// Server rejected the stored credential
    Unauthorized(String),
    /// Leave the expired session for the login page
    Redirect,
    /// A protected view was reached without a credential
    RequireLogin(String),
    Logout,
    Navigate(Route),
    /// A request failed without affecting the session
    ShowError(String),
}

impl Default for SessionContextData {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Anonymous,
            route: Route::Login,
            error: None,
            notice: None,
        }
    }
}

impl SessionContextData {
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.phase, SessionPhase::Authenticated)
    }

    /// Apply an action, returning the next state
    #[must_use]
    pub fn reduce(self, action: SessionAction) -> Self {
        use SessionAction as A;
        use SessionPhase as P;

        let from = self.phase;
        let next = match (from, action) {
            (P::Authenticating, A::Restore { .. }) => self,
            (_, A::Restore { has_credential }) => {
                if has_credential {
                    Self {
                        phase: P::Authenticated,
                        route: Route::Dashboard,
                        ..Self::default()
                    }
                } else {
                    Self::default()
                }
            }
            (P::Anonymous | P::Authenticated, A::SubmitLogin) => Self {
                phase: P::Authenticating,
                route: Route::Login,
                error: None,
                notice: None,
            },
            (P::Authenticating, A::LoginSucceeded) => Self {
                phase: P::Authenticated,
                route: Route::Login,
                error: None,
                notice: Some("Login successful! Redirecting...".to_string()),
            },
            (P::Authenticating, A::LoginFailed(message)) => Self {
                error: Some(message),
                ..Self::default()
            },
            (P::Authenticated, A::Unauthorized(message)) => Self {
                phase: P::SessionExpired,
                error: Some(message),
                notice: None,
                ..self
            },
            (P::SessionExpired, A::Redirect) => Self {
                phase: P::Anonymous,
                route: Route::Login,
                notice: None,
                ..self
            },
            (_, A::RequireLogin(message)) => Self {
                error: Some(message),
                ..Self::default()
            },
            (_, A::Logout) => Self::default(),
            (phase, A::Navigate(route)) => {
                let route = route.resolve();
                if route.requires_session() && phase != P::Authenticated {
                    Self {
                        route: Route::Login,
                        ..self
                    }
                } else {
                    Self {
                        route,
                        notice: None,
                        ..self
                    }
                }
            }
            (_, A::ShowError(message)) => Self {
                error: Some(message),
                ..self
            },
            (phase, action) => {
                debug!(?phase, ?action, "Ignoring action in current phase");
                self
            }
        };

        if next.phase != from {
            debug!(?from, to = ?next.phase, "Session phase changed");
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(phase: SessionPhase) -> SessionContextData {
        SessionContextData {
            phase,
            ..SessionContextData::default()
        }
    }

    #[test]
    fn test_login_success_path() {
        let state = SessionContextData::default()
            .reduce(SessionAction::SubmitLogin)
            .reduce(SessionAction::LoginSucceeded);
        assert_eq!(state.phase, SessionPhase::Authenticated);
        assert!(state.notice.is_some());

        let state = state.reduce(SessionAction::Navigate(Route::Dashboard));
        assert_eq!(state.route, Route::Dashboard);
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_login_failure_returns_to_anonymous() {
        let state = SessionContextData::default()
            .reduce(SessionAction::SubmitLogin)
            .reduce(SessionAction::LoginFailed("Invalid credentials".into()));
        assert_eq!(state.phase, SessionPhase::Anonymous);
        assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
        assert_eq!(state.route, Route::Login);
    }

    #[test]
    fn test_expiry_then_redirect() {
        let state = at(SessionPhase::Authenticated)
            .reduce(SessionAction::Navigate(Route::Users))
            .reduce(SessionAction::Unauthorized("expired".into()));
        assert_eq!(state.phase, SessionPhase::SessionExpired);
        assert_eq!(state.route, Route::Users);

        let state = state.reduce(SessionAction::Redirect);
        assert_eq!(state.phase, SessionPhase::Anonymous);
        assert_eq!(state.route, Route::Login);
        assert_eq!(state.error.as_deref(), Some("expired"));
    }

    #[test]
    fn test_logout_from_any_phase() {
        for phase in [
            SessionPhase::Anonymous,
            SessionPhase::Authenticating,
            SessionPhase::Authenticated,
            SessionPhase::SessionExpired,
        ] {
            let state = at(phase).reduce(SessionAction::Logout);
            assert_eq!(state, SessionContextData::default());
        }
    }

    #[test]
    fn test_invalid_transitions_are_ignored() {
        let anonymous = SessionContextData::default();
        assert_eq!(
            anonymous.clone().reduce(SessionAction::LoginSucceeded),
            anonymous
        );
        assert_eq!(
            anonymous.clone().reduce(SessionAction::Unauthorized("x".into())),
            anonymous
        );

        let authenticating = at(SessionPhase::Authenticating);
        assert_eq!(
            authenticating.clone().reduce(SessionAction::SubmitLogin),
            authenticating
        );
        assert_eq!(
            authenticating
                .clone()
                .reduce(SessionAction::Restore { has_credential: true }),
            authenticating
        );

        let expired = at(SessionPhase::SessionExpired);
        assert_eq!(expired.clone().reduce(SessionAction::SubmitLogin), expired);
    }

    #[test]
    fn test_restore() {
        let state = SessionContextData::default().reduce(SessionAction::Restore {
            has_credential: true,
        });
        assert!(state.is_authenticated());
        assert_eq!(state.route, Route::Dashboard);

        let state = state.reduce(SessionAction::Restore {
            has_credential: false,
        });
        assert_eq!(state, SessionContextData::default());
    }

    #[test]
    fn test_protected_route_requires_session() {
        let state = SessionContextData::default().reduce(SessionAction::Navigate(Route::Users));
        assert_eq!(state.route, Route::Login);

        let state = SessionContextData::default().reduce(SessionAction::Navigate(Route::Dashboard));
        assert_eq!(state.route, Route::Dashboard);

        let state = at(SessionPhase::Authenticated).reduce(SessionAction::Navigate(Route::Root));
        assert_eq!(state.route, Route::Dashboard);
    }
}
