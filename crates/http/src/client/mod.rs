//! Portal HTTP client

pub mod auth;
pub mod error;
pub mod users;

use error::ClientError;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Whole-request timeout applied when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("portal-client/", env!("CARGO_PKG_VERSION"));

/// Request body encodings understood by the services
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// `application/json`
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// Serialize a value as a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self, ClientError> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Build a form body from key/value pairs
    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    fn apply(self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Json(value) => request.json(&value),
            Self::Form(pairs) => request.form(&pairs),
        }
    }
}

/// Portal API client bound to one service base URL
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request builder for a path relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Preparing request");
        self.client.request(method, url)
    }

    /// Issue one request and return the decoded JSON body
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unreachable`] when no response arrives and
    /// [`ClientError::Status`] for any non-success status
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        headers: Option<HeaderMap>,
    ) -> Result<Value, ClientError> {
        self.send_as(method, path, body, headers).await
    }

    /// Same as [`Self::send`], decoding into a concrete type
    ///
    /// # Errors
    ///
    /// See [`Self::send`]; also fails if the body does not match `T`
    pub async fn send_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        headers: Option<HeaderMap>,
    ) -> Result<T, ClientError> {
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = body.apply(request);
        }
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        self.execute(request).await
    }

    /// Execute a request and handle common errors
    ///
    /// # Errors
    ///
    /// See [`Self::send`]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await.map_err(ClientError::from_transport)?;
        let status = response.status();

        if status.is_success() {
            let bytes = response
                .bytes()
                .await
                .map_err(ClientError::from_transport)?;
            // Some endpoints answer 2xx with no body at all
            let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
            Ok(serde_json::from_slice(body)?)
        } else {
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            debug!(status = status.as_u16(), "Request failed");
            Err(ClientError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Headers carrying a bearer credential
    ///
    /// # Errors
    ///
    /// Returns an error if the token contains characters not allowed in a header
    pub fn bearer(token: &str) -> Result<HeaderMap, ClientError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ClientError::Configuration("access credential is not a valid header value".into())
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or not an absolute URL
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        url::Url::parse(&base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base_url '{base_url}': {e}"))
        })?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let client = ClientBuilder::new()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(ApiClient { client, base_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header_is_sensitive() {
        let headers = ApiClient::bearer("T1").unwrap();
        let value = headers.get(header::AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer T1");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_bearer_rejects_control_characters() {
        assert!(matches!(
            ApiClient::bearer("bad\ntoken"),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn test_form_body_pairs() {
        let body = RequestBody::form([("username", "a@b.com"), ("password", "x")]);
        match body {
            RequestBody::Form(pairs) => {
                assert_eq!(pairs[0], ("username".to_string(), "a@b.com".to_string()));
                assert_eq!(pairs.len(), 2);
            }
            RequestBody::Json(_) => panic!("expected form body"),
        }
    }
}
