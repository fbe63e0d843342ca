//! Request and response bodies exchanged with the auth and user services

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub use portal_core::{TokenPair, UserRecord};

/// JSON login body
#[derive(Serialize)]
pub struct LoginJson<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
}

/// Partial user update. Absent fields are left unchanged by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserUpdate {
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

/// Error body returned by the services on failure
///
/// `detail` is usually a message string; request validation failures carry
/// a list of `{loc, msg, type}` objects instead.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub detail: JsonValue,
}

impl ErrorDetail {
    /// Human-readable message, if the body carries one
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            JsonValue::String(message) => Some(message.clone()),
            JsonValue::Array(items) => items
                .iter()
                .find_map(|item| item.get("msg").and_then(JsonValue::as_str))
                .map(str::to_string),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_detail_string() {
        let detail: ErrorDetail =
            serde_json::from_value(json!({"detail": "Invalid credentials"})).unwrap();
        assert_eq!(detail.message().as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn test_error_detail_validation_list() {
        let detail: ErrorDetail = serde_json::from_value(json!({
            "detail": [{
                "loc": ["body", "email"],
                "msg": "value is not a valid email address",
                "type": "value_error"
            }]
        }))
        .unwrap();
        assert_eq!(
            detail.message().as_deref(),
            Some("value is not a valid email address")
        );
    }

    #[test]
    fn test_user_update_skips_absent_fields() {
        let update = UserUpdate {
            email: Some("new@b.com".into()),
            password: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"email": "new@b.com"})
        );
        assert!(UserUpdate::default().is_empty());
    }
}
