//! User-management API client methods

use super::error::{ClientError, ResourceError};
use super::{ApiClient, RequestBody};
use crate::types::{NewUser, UserRecord, UserUpdate};
use portal_core::{SessionKey, SessionStore};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{error, warn};

/// Client for the user service, authenticated from the session store
///
/// The access credential is read from the store on every call, so a login or
/// logout in another view takes effect immediately.
#[derive(Clone)]
pub struct UserGateway {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
    access_key: SessionKey,
}

impl UserGateway {
    /// Create a gateway reading the credential from `access_token`
    pub fn new(client: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            access_key: SessionKey::AccessToken,
        }
    }

    /// Read the credential from a different key (the legacy client uses `token`)
    #[must_use]
    pub const fn with_access_key(mut self, key: SessionKey) -> Self {
        self.access_key = key;
        self
    }

    /// Key the access credential is read from
    pub const fn access_key(&self) -> SessionKey {
        self.access_key
    }

    /// List users with the server's default paging
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Unauthenticated`] without any network call
    /// when no credential is stored, [`ResourceError::Unauthorized`] when the
    /// server rejects it, and [`ResourceError::Client`] for anything else
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ResourceError> {
        self.authorized(Method::GET, "/users/", None).await
    }

    /// List one page of users
    ///
    /// # Errors
    ///
    /// See [`Self::list_users`]
    pub async fn list_users_page(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<UserRecord>, ResourceError> {
        let path = format!("/users/?skip={skip}&limit={limit}");
        self.authorized(Method::GET, &path, None).await
    }

    /// Fetch the record of the signed-in user
    ///
    /// # Errors
    ///
    /// See [`Self::list_users`]
    pub async fn current_user(&self) -> Result<UserRecord, ResourceError> {
        self.authorized(Method::GET, "/users/me", None).await
    }

    /// Fetch a single user by id
    ///
    /// # Errors
    ///
    /// See [`Self::list_users`]; a missing user is a 404 status error
    pub async fn get_user(&self, id: i64) -> Result<UserRecord, ResourceError> {
        self.authorized(Method::GET, &format!("/users/{id}"), None).await
    }

    /// Change a user's email and/or password
    ///
    /// # Errors
    ///
    /// See [`Self::list_users`]
    pub async fn update_user(
        &self,
        id: i64,
        update: &UserUpdate,
    ) -> Result<UserRecord, ResourceError> {
        let body = RequestBody::json(update)?;
        self.authorized(Method::PUT, &format!("/users/{id}"), Some(body)).await
    }

    /// Delete a user, returning the removed record
    ///
    /// # Errors
    ///
    /// See [`Self::list_users`]
    pub async fn delete_user(&self, id: i64) -> Result<UserRecord, ResourceError> {
        self.authorized(Method::DELETE, &format!("/users/{id}"), None).await
    }

    /// Create an account. Public endpoint: no credential is required or sent.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Client`] on any failure
    pub async fn register(&self, user: &NewUser) -> Result<UserRecord, ResourceError> {
        let body = RequestBody::json(user)?;
        Ok(self
            .client
            .send_as(Method::POST, "/users/", Some(body), None)
            .await?)
    }

    fn credential(&self) -> Result<String, ResourceError> {
        self.store
            .get(self.access_key)?
            .ok_or(ResourceError::Unauthenticated)
    }

    async fn authorized<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<T, ResourceError> {
        let token = self.credential()?;
        let headers = ApiClient::bearer(&token)?;

        match self.client.send_as(method, path, body, Some(headers)).await {
            Ok(value) => Ok(value),
            Err(err) if err.is_auth_rejected() => Err(self.reject(&err)),
            Err(err) => Err(err.into()),
        }
    }

    /// Drop the rejected credential and build the error for the caller
    fn reject(&self, err: &ClientError) -> ResourceError {
        let status = err.status().unwrap_or_default();
        warn!(status, key = %self.access_key, "Credential rejected, clearing it");

        if let Err(store_err) = self.store.remove(self.access_key) {
            error!("Failed to clear rejected credential: {store_err}");
        }

        ResourceError::Unauthorized {
            status,
            message: err.detail().unwrap_or_else(|| "Session expired".to_string()),
        }
    }
}
