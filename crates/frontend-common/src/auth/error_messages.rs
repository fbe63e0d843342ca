//! User-friendly error message mappings

use portal_core::CoreError;
use portal_http::{AuthError, ClientError, ResourceError};

pub const CANNOT_REACH_SERVER: &str = "Cannot reach server";
pub const MISSING_FIELDS: &str = "Email and password are required";
pub const NOT_SIGNED_IN: &str = "You are not signed in";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
pub const LOAD_FAILED: &str = "Could not load data";

/// Message shown for a failed login
pub fn login_message(error: &AuthError) -> String {
    match error {
        // Server detail is shown verbatim
        AuthError::Rejected { message, .. } => message.clone(),
        AuthError::Client(err) => client_message(err, "Login failed"),
    }
}

/// Message shown for a failed data request
pub fn resource_message(error: &ResourceError) -> String {
    match error {
        ResourceError::Unauthenticated => NOT_SIGNED_IN.to_string(),
        ResourceError::Unauthorized { .. } => SESSION_EXPIRED.to_string(),
        ResourceError::Client(err) => client_message(err, LOAD_FAILED),
        ResourceError::Store(err) => store_message(err),
    }
}

pub fn store_message(error: &CoreError) -> String {
    format!("Session storage unavailable: {error}")
}

fn client_message(error: &ClientError, fallback: &str) -> String {
    match error {
        ClientError::Unreachable(_) => CANNOT_REACH_SERVER.to_string(),
        ClientError::Status { .. } => error.detail().unwrap_or_else(|| fallback.to_string()),
        ClientError::Decode(_) | ClientError::Configuration(_) => error.to_string(),
    }
}
