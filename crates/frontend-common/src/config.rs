//! Frontend configuration

use portal_core::{PortalConfig, SessionKey};
use std::time::Duration;

/// Settings the session controller needs from the client configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewConfig {
    /// Key holding the access credential
    pub access_key: SessionKey,

    /// Pause between a successful login and navigation. Purely cosmetic.
    pub redirect_delay: Duration,
}

impl ViewConfig {
    pub fn from_portal(config: &PortalConfig) -> Self {
        Self {
            access_key: config.session.access_key,
            redirect_delay: config.redirect_delay(),
        }
    }

    /// No redirect pause, for tests and scripted use
    #[must_use]
    pub const fn immediate(mut self) -> Self {
        self.redirect_delay = Duration::ZERO;
        self
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::from_portal(&PortalConfig::default())
    }
}
