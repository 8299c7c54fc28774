// src/api/error.rs
// Centralized mapping from domain errors to HTTP responses.

use crate::error::VaultError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use tracing::error;

/// Standard API error response format.
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::BAD_REQUEST,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::NOT_FOUND,
        }
    }
}

impl From<VaultError> for ApiError {
    fn from(e: VaultError) -> Self {
        let status_code = match &e {
            VaultError::NotFound { .. } => StatusCode::NOT_FOUND,
            VaultError::Duplicate { .. } => StatusCode::CONFLICT,
            VaultError::Validation(_) | VaultError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
            VaultError::OracleUnavailable(_) => StatusCode::BAD_GATEWAY,
            VaultError::MergeFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            VaultError::Persistence(_) | VaultError::WorkflowState(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status_code.is_server_error() {
            error!("request failed: {e}");
        }
        Self {
            message: e.to_string(),
            status_code,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": true,
            "message": self.message,
            "status": self.status_code.as_u16()
        });
        (self.status_code, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_the_documented_statuses() {
        let cases = [
            (
                VaultError::NotFound {
                    path: "/".into(),
                    name: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                VaultError::Duplicate {
                    path: "/".into(),
                    name: "x".into(),
                },
                StatusCode::CONFLICT,
            ),
            (VaultError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (VaultError::InvalidDocument("d".into()), StatusCode::BAD_REQUEST),
            (VaultError::OracleUnavailable("o".into()), StatusCode::BAD_GATEWAY),
            (VaultError::MergeFailed("m".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (VaultError::Persistence("p".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status_code, expected);
        }
    }
}
