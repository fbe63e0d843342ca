//! Authentication API client methods

use super::error::AuthError;
use super::{ApiClient, RequestBody};
use crate::types::{LoginJson, TokenPair};
use portal_core::LoginEncoding;
use reqwest::Method;
use tracing::{debug, info};

const LOGIN_PATH: &str = "/auth/login";

/// Client for the authentication service
#[derive(Clone)]
pub struct AuthGateway {
    client: ApiClient,
    encoding: LoginEncoding,
}

impl AuthGateway {
    /// Create a gateway that posts logins in the given encoding
    pub const fn new(client: ApiClient, encoding: LoginEncoding) -> Self {
        Self { client, encoding }
    }

    /// Encoding this gateway uses for the login payload
    pub const fn encoding(&self) -> LoginEncoding {
        self.encoding
    }

    /// Exchange an identifier and secret for issued tokens
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] with the server's detail message (or
    /// "Login failed") on any non-success status, and [`AuthError::Client`]
    /// when the server cannot be reached
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<TokenPair, AuthError> {
        let body = match self.encoding {
            // The form variant names the identifier field `username`
            LoginEncoding::Form => {
                RequestBody::form([("username", identifier), ("password", secret)])
            }
            LoginEncoding::Json => RequestBody::json(&LoginJson {
                email: identifier,
                password: secret,
            })?,
        };

        debug!(encoding = self.encoding.as_str(), "Submitting login");
        let tokens: TokenPair = self
            .client
            .send_as(Method::POST, LOGIN_PATH, Some(body), None)
            .await
            .map_err(AuthError::from_client)?;

        info!(
            has_refresh_token = tokens.refresh_token.is_some(),
            "Login accepted"
        );
        Ok(tokens)
    }
}
