use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the guild service refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The service is unreachable or still starting; retrying later may work.
    Unavailable,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// Wire form of a failed guild request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// A failed guild request as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code})")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ApiError> for ApiException {
    fn from(ApiError { code, message }: ApiError) -> Self {
        Self { code, message }
    }
}

impl From<ApiException> for ApiError {
    fn from(ApiException { code, message }: ApiException) -> Self {
        Self { code, message }
    }
}
