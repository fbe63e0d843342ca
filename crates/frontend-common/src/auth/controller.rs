//! Page-level session orchestration
//!
//! The controller is the only place that writes credentials after a login
//! and decides what the user sees when a request fails. Gateway errors are
//! returned to the caller unchanged; the controller additionally records the
//! user-facing message in its state.

use super::context::{SessionAction, SessionContextData, SessionPhase};
use super::error_messages::{self, MISSING_FIELDS, NOT_SIGNED_IN, SESSION_EXPIRED};
use crate::client::{Gateways, create_gateways};
use crate::config::ViewConfig;
use crate::routes::Route;
use portal_core::{CoreError, PortalConfig, SessionKey, SessionStore, TokenPair, UserRecord};
use portal_http::types::{NewUser, UserUpdate};
use portal_http::{AuthError, AuthGateway, ClientError, ResourceError, UserGateway};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Reasons a submitted form (login or sign-up) did not go through
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Email and password are required")]
    MissingFields,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Store(#[from] CoreError),
}

/// Session-aware view controller
pub struct SessionController {
    auth: AuthGateway,
    users: UserGateway,
    store: Arc<dyn SessionStore>,
    config: ViewConfig,
    state: SessionContextData,
}

impl SessionController {
    pub fn new(gateways: Gateways, store: Arc<dyn SessionStore>, config: ViewConfig) -> Self {
        Self {
            auth: gateways.auth,
            users: gateways.users,
            store,
            config,
            state: SessionContextData::default(),
        }
    }

    /// Build a controller for the configured services
    ///
    /// # Errors
    ///
    /// Returns an error if a base URL is invalid
    pub fn from_config(
        config: &PortalConfig,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ClientError> {
        let gateways = create_gateways(config, Arc::clone(&store))?;
        Ok(Self::new(gateways, store, ViewConfig::from_portal(config)))
    }

    pub const fn state(&self) -> &SessionContextData {
        &self.state
    }

    pub const fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub const fn route(&self) -> Route {
        self.state.route
    }

    fn dispatch(&mut self, action: SessionAction) {
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(action);
    }

    /// Page load: pick up a credential persisted by an earlier session
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read
    pub fn restore(&mut self) -> Result<SessionPhase, CoreError> {
        let has_credential = self.store.get(self.config.access_key)?.is_some();
        self.dispatch(SessionAction::Restore { has_credential });
        Ok(self.phase())
    }

    /// Move to another view, subject to the session guard
    pub fn navigate(&mut self, route: Route) -> Route {
        self.dispatch(SessionAction::Navigate(route));
        self.route()
    }

    /// Submit the login form
    ///
    /// Credentials are persisted before navigation starts. On failure the
    /// state carries the message to display and the store holds no
    /// credentials, including those of a session this login was replacing.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingFields`] without contacting the server
    /// when either field is blank, otherwise the gateway or store error
    pub async fn login(&mut self, identifier: &str, secret: &str) -> Result<(), FormError> {
        let identifier = self.require_fields(identifier, secret)?;

        self.dispatch(SessionAction::SubmitLogin);

        let tokens = match self.auth.login(identifier, secret).await {
            Ok(tokens) => tokens,
            Err(err) => {
                self.discard_credentials();
                self.dispatch(SessionAction::LoginFailed(error_messages::login_message(
                    &err,
                )));
                return Err(err.into());
            }
        };

        if let Err(err) = self.persist(&tokens) {
            self.discard_credentials();
            self.dispatch(SessionAction::LoginFailed(error_messages::store_message(
                &err,
            )));
            return Err(err.into());
        }

        info!("Signed in");
        self.dispatch(SessionAction::LoginSucceeded);

        if !self.config.redirect_delay.is_zero() {
            tokio::time::sleep(self.config.redirect_delay).await;
        }
        self.navigate(Route::Dashboard);
        Ok(())
    }

    fn persist(&self, tokens: &TokenPair) -> Result<(), CoreError> {
        self.store.set(self.config.access_key, &tokens.access_token)?;
        match &tokens.refresh_token {
            Some(refresh) => self.store.set(SessionKey::RefreshToken, refresh),
            // Never leave a refresh token from an earlier session next to a new access token
            None => self.store.remove(SessionKey::RefreshToken),
        }
    }

    /// Best-effort removal after a failed login, so a restore cannot
    /// resurrect a session the user was told does not exist
    fn discard_credentials(&self) {
        for key in [self.config.access_key, SessionKey::RefreshToken] {
            if let Err(err) = self.store.remove(key) {
                error!(%key, "Failed to discard credential: {err}");
            }
        }
    }

    /// Sign out and return to the login view
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be updated; the view
    /// still returns to the login page
    pub fn logout(&mut self) -> Result<(), CoreError> {
        let result = self
            .store
            .remove(self.config.access_key)
            .and_then(|()| self.store.remove(SessionKey::RefreshToken));
        self.dispatch(SessionAction::Logout);
        info!("Signed out");
        result
    }

    /// Load the user table
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged
    pub async fn list_users(&mut self) -> Result<Vec<UserRecord>, ResourceError> {
        let result = self.users.list_users().await;
        self.settle(result)
    }

    /// Load one page of the user table
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged
    pub async fn list_users_page(
        &mut self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<UserRecord>, ResourceError> {
        let result = self.users.list_users_page(skip, limit).await;
        self.settle(result)
    }

    /// Load the signed-in user's own record
    ///
    /// # Errors
    ///
    /// Returns the gateway error unchanged
    pub async fn current_user(&mut self) -> Result<UserRecord, ResourceError> {
        let result = self.users.current_user().await;
        self.settle(result)
    }

    /// # Errors
    ///
    /// Returns the gateway error unchanged
    pub async fn get_user(&mut self, id: i64) -> Result<UserRecord, ResourceError> {
        let result = self.users.get_user(id).await;
        self.settle(result)
    }

    /// # Errors
    ///
    /// Returns the gateway error unchanged
    pub async fn update_user(
        &mut self,
        id: i64,
        update: &UserUpdate,
    ) -> Result<UserRecord, ResourceError> {
        let result = self.users.update_user(id, update).await;
        self.settle(result)
    }

    /// # Errors
    ///
    /// Returns the gateway error unchanged
    pub async fn delete_user(&mut self, id: i64) -> Result<UserRecord, ResourceError> {
        let result = self.users.delete_user(id).await;
        self.settle(result)
    }

    /// Submit the sign-up form. Success leads to the login view.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingFields`] for blank fields, otherwise the
    /// gateway error
    pub async fn register(&mut self, email: &str, password: &str) -> Result<UserRecord, FormError> {
        let email = self.require_fields(email, password)?;

        let user = NewUser {
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.users.register(&user).await {
            Ok(record) => {
                info!(user_id = record.id, "Registered account");
                self.navigate(Route::Login);
                Ok(record)
            }
            Err(err) => {
                self.dispatch(SessionAction::ShowError(error_messages::resource_message(
                    &err,
                )));
                Err(err.into())
            }
        }
    }

    /// Presence check shared by the login and sign-up forms
    fn require_fields<'a>(
        &mut self,
        identifier: &'a str,
        secret: &str,
    ) -> Result<&'a str, FormError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || secret.is_empty() {
            self.dispatch(SessionAction::ShowError(MISSING_FIELDS.to_string()));
            return Err(FormError::MissingFields);
        }
        Ok(identifier)
    }

    /// Update view state from a gateway result and hand the result back
    fn settle<T>(&mut self, result: Result<T, ResourceError>) -> Result<T, ResourceError> {
        if let Err(err) = &result {
            match err {
                ResourceError::Unauthorized { status, .. } => {
                    // The gateway has already dropped the credential
                    warn!(status, "Session expired");
                    if self.state.is_authenticated() {
                        self.dispatch(SessionAction::Unauthorized(SESSION_EXPIRED.to_string()));
                        self.dispatch(SessionAction::Redirect);
                    } else {
                        self.dispatch(SessionAction::RequireLogin(SESSION_EXPIRED.to_string()));
                    }
                }
                ResourceError::Unauthenticated => {
                    self.dispatch(SessionAction::RequireLogin(NOT_SIGNED_IN.to_string()));
                }
                other => {
                    self.dispatch(SessionAction::ShowError(error_messages::resource_message(
                        other,
                    )));
                }
            }
        }
        result
    }
}
