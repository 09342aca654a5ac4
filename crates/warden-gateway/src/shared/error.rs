use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Gateway errors with their HTTP mappings.
///
/// Response bodies are JSON string literals; internal detail stays in logs.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request signature")]
    InvalidSignature,
    #[error("unhandled request type")]
    UnhandledRequestType,
    #[error("Unhandled command")]
    UnhandledCommand,
    #[error("worker dispatch failed: {0}")]
    DispatchFailed(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidSignature => StatusCode::UNAUTHORIZED,
            GatewayError::UnhandledRequestType | GatewayError::UnhandledCommand => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::DispatchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::InvalidSignature => "invalid request signature",
            GatewayError::UnhandledRequestType => "unhandled request type",
            GatewayError::UnhandledCommand => "Unhandled command",
            GatewayError::DispatchFailed(_) => "internal error",
        }
    }

    /// Metric label for the outcome.
    pub fn status_label(&self) -> &'static str {
        match self {
            GatewayError::InvalidSignature => "unauthorized",
            GatewayError::UnhandledRequestType => "unhandled_type",
            GatewayError::UnhandledCommand => "unhandled_command",
            GatewayError::DispatchFailed(_) => "dispatch_failed",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.public_message())).into_response()
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
