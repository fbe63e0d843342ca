//! Portal HTTP module providing the transport wrapper and gateway clients
//!
//! Every request to the auth and user services goes through
//! [`client::ApiClient`], which owns the base URL, timeout and error
//! normalisation policy. The gateways on top of it translate local calls into
//! service endpoints.

pub mod client;
pub mod types;

pub use client::auth::AuthGateway;
pub use client::error::{AuthError, ClientError, ResourceError};
pub use client::users::UserGateway;
pub use client::{ApiClient, RequestBody};
