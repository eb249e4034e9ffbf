//! Request and response bodies of the admin REST API.

use crate::draft::Password;
use crate::user::User;
use serde::{Deserialize, Serialize};

/// `GET /api/admin/users` wraps the collection in an object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersEnvelope {
    #[serde(default)]
    pub users: Vec<User>,
}

/// Request payload to create a user via admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    pub email: String,
    pub password: Password,
    /// Role names chosen from the catalog.
    pub roles: Vec<String>,
}

/// Request payload to update a user via admin endpoints.
///
/// Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Password>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// Plain acknowledgement body, e.g. the delete response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Error body shapes the backend is known to emit.
///
/// Spring-style error documents carry both `message` and `error`; the
/// former is the human readable one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ServerMessage {
    /// Pull the operator-facing message out of a failed response body.
    ///
    /// Preference order: JSON `message`, JSON `error`, then the raw body when
    /// it is plain text. HTML error pages and empty bodies yield `None`.
    pub fn from_body(body: &str) -> Option<String> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(parsed) = serde_json::from_str::<ServerMessage>(trimmed) {
            return parsed
                .message
                .filter(|m| !m.trim().is_empty())
                .or(parsed.error.filter(|e| !e.trim().is_empty()));
        }

        if trimmed.starts_with('<') {
            return None;
        }
        Some(trimmed.to_string())
    }
}
