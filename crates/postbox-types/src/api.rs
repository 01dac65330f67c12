use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::models::{Message, User};

/// Body of a successful `DELETE /messages/{id}`.
pub const DELETED: &str = "Successfully deleted.";

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMessageRequest {
    pub title: String,
    pub body: String,
    pub author: UserId,
}

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMessageRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl UpdateMessageRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

/// `{ "message": ... }`. Carries either a full message or, for deletes,
/// the confirmation string.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageEnvelope<T> {
    pub message: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesEnvelope {
    pub messages: Vec<Message>,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
