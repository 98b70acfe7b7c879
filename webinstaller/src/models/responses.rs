// API response models
// Every action answers with a header describing the outcome and an optional body.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub id: Uuid,
    pub status: ResponseStatus,
    /// Unix timestamp (seconds) at which the response was built
    pub servertime: i64,
    pub action: String,
    pub message: String,
    pub url: String,
    pub code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub header: ResponseHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    fn build(
        status: ResponseStatus,
        code: u16,
        action: &str,
        url: &str,
        message: impl Into<String>,
        body: Option<T>,
    ) -> Self {
        ApiResponse {
            header: ResponseHeader {
                id: Uuid::new_v4(),
                status,
                servertime: Utc::now().timestamp(),
                action: action.to_string(),
                message: message.into(),
                url: url.to_string(),
                code,
            },
            body,
        }
    }

    pub fn success(action: &str, url: &str, message: impl Into<String>, body: T) -> Self {
        Self::build(ResponseStatus::Success, 200, action, url, message, Some(body))
    }

    pub fn error(action: &str, url: &str, code: u16, message: impl Into<String>) -> Self {
        Self::build(ResponseStatus::Error, code, action, url, message, None)
    }

    pub fn is_success(&self) -> bool {
        self.header.status == ResponseStatus::Success
    }
}

/// Body of the installer's database step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCheckResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_valid: Option<bool>,
}
