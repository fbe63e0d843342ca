//! Client configuration
//!
//! Values are layered: built-in defaults, then an optional file (TOML, YAML
//! or JSON, picked by extension), then `PORTAL_*` environment variables with
//! `__` between sections, e.g. `PORTAL_AUTH__BASE_URL`.

use crate::session::SessionKey;
use crate::state_dir::StateDir;
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PortalConfig {
    /// Authentication service
    pub auth: AuthConfig,

    /// User-management service
    pub users: UsersConfig,

    /// HTTP transport settings
    pub http: HttpConfig,

    /// Credential persistence
    pub session: SessionConfig,

    /// View behaviour
    pub ui: UiConfig,
}

/// How the login form is encoded for the auth service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoginEncoding {
    /// `application/x-www-form-urlencoded` with `username` and `password`
    #[default]
    Form,
    /// JSON object with `email` and `password`
    Json,
}

impl LoginEncoding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL that `/auth/login` is appended to
    pub base_url: String,

    /// Login payload encoding expected by this backend
    pub login_encoding: LoginEncoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersConfig {
    /// Base URL that `/users/...` paths are appended to
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session file location. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Key holding the access credential (`access_token` or legacy `token`)
    pub access_key: SessionKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Pause between a successful login and navigation, in milliseconds
    pub redirect_delay_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/api".to_string(),
            login_encoding: LoginEncoding::Form,
        }
    }
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/api".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: None,
            access_key: SessionKey::AccessToken,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            redirect_delay_ms: 1000,
        }
    }
}

impl PortalConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value fails to parse
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("auth.base_url", defaults.auth.base_url)?
            .set_default("auth.login_encoding", defaults.auth.login_encoding.as_str())?
            .set_default("users.base_url", defaults.users.base_url)?
            .set_default("http.timeout_secs", defaults.http.timeout_secs)?
            .set_default("session.access_key", defaults.session.access_key.as_str())?
            .set_default("ui.redirect_delay_ms", defaults.ui.redirect_delay_ms)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("PORTAL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid value
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("auth.base_url", &self.auth.base_url),
            ("users.base_url", &self.users.base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| CoreError::invalid_config(format!("{name} '{value}': {e}")))?;
        }

        if self.http.timeout_secs == 0 {
            return Err(CoreError::invalid_config(
                "http.timeout_secs must be greater than zero",
            ));
        }

        if self.session.access_key == SessionKey::RefreshToken {
            return Err(CoreError::invalid_config(
                "session.access_key cannot be refresh_token",
            ));
        }

        Ok(())
    }

    /// Request timeout as a duration
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Post-login navigation delay as a duration
    pub const fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.ui.redirect_delay_ms)
    }

    /// Session file location, falling back to the state directory
    pub fn session_path(&self, state_dir: &StateDir) -> PathBuf {
        self.session
            .path
            .clone()
            .unwrap_or_else(|| state_dir.session_path())
    }

    /// Render as TOML, for writing a starter configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_toml(&self) -> CoreResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
