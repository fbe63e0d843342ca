//! Navigation surface of the client

use std::fmt;

/// Reachable views
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`, an alias for the dashboard
    Root,
    Login,
    Register,
    Dashboard,
    Users,
    Profile,
}

impl Route {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::Users => "/users",
            Self::Profile => "/users/me",
        }
    }

    /// Follow redirects to the view that actually renders
    #[must_use]
    pub const fn resolve(self) -> Self {
        match self {
            Self::Root => Self::Dashboard,
            other => other,
        }
    }

    /// Views that fetch protected data
    pub const fn requires_session(self) -> bool {
        matches!(self, Self::Users | Self::Profile)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
