//! Client configuration and initialization

pub use portal_http::ClientError;
use portal_core::{PortalConfig, SessionStore};
use portal_http::{ApiClient, AuthGateway, UserGateway};
use std::sync::Arc;

/// The two service clients a view talks to
#[derive(Clone)]
pub struct Gateways {
    pub auth: AuthGateway,
    pub users: UserGateway,
}

/// Build the gateways for the configured services
///
/// # Errors
///
/// Returns an error if a base URL is invalid
pub fn create_gateways(
    config: &PortalConfig,
    store: Arc<dyn SessionStore>,
) -> Result<Gateways, ClientError> {
    let auth_client = ApiClient::builder()
        .base_url(&config.auth.base_url)
        .timeout(config.timeout())
        .build()?;

    let users_client = ApiClient::builder()
        .base_url(&config.users.base_url)
        .timeout(config.timeout())
        .build()?;

    Ok(Gateways {
        auth: AuthGateway::new(auth_client, config.auth.login_encoding),
        users: UserGateway::new(users_client, store).with_access_key(config.session.access_key),
    })
}
