//! Response envelope produced for every command.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DevstoreError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{status, message?, code?, data?, httpStatusHint}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub http_status_hint: u16,
}

impl Response {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: Some(message.into()),
            code: None,
            data: None,
            http_status_hint: 200,
        }
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            status: Status::Success,
            message: None,
            code: None,
            data: Some(data),
            http_status_hint: 200,
        }
    }

    pub fn error(err: &DevstoreError) -> Self {
        let kind = err.kind();
        Self {
            status: Status::Error,
            message: Some(err.to_string()),
            code: Some(kind),
            data: None,
            http_status_hint: kind.http_status_hint(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_shape() {
        let json = serde_json::to_value(Response::success("User signed in.")).unwrap();
        assert_eq!(
            json,
            json!({"status": "success", "message": "User signed in.", "httpStatusHint": 200})
        );
    }

    #[test]
    fn error_shape() {
        let json = serde_json::to_value(Response::error(&DevstoreError::InvalidCredentials)).unwrap();
        assert_eq!(
            json,
            json!({
                "status": "error",
                "message": "invalid email or password",
                "code": "INVALID_CREDENTIALS",
                "httpStatusHint": 401
            })
        );
    }
}
