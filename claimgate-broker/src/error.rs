//! Broker error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use claimgate_core::AuthError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid login case: {0}")]
    InvalidCase(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            BrokerError::Auth(AuthError::NotLoggedIn) => {
                (StatusCode::UNAUTHORIZED, "Not logged in".to_string())
            }
            BrokerError::Auth(AuthError::InvalidConfirmationCode) => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired confirmation code".to_string(),
            ),
            BrokerError::Auth(AuthError::AccountAlreadyExists) => {
                (StatusCode::CONFLICT, "Account already exists".to_string())
            }
            BrokerError::Auth(AuthError::AccountConflict) => (
                StatusCode::CONFLICT,
                "Login would merge two distinct accounts".to_string(),
            ),
            BrokerError::Auth(AuthError::AddressAccountConflict) => (
                StatusCode::CONFLICT,
                "Address is owned by a different account".to_string(),
            ),
            BrokerError::Auth(AuthError::AccountCreationDenied) => (
                StatusCode::FORBIDDEN,
                "Account can not be created".to_string(),
            ),
            BrokerError::Auth(AuthError::Store(msg)) => {
                tracing::error!("Store error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            BrokerError::InvalidCase(msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid login case: {msg}"))
            }
            BrokerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
