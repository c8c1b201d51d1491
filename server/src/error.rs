//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quotesync_engine::Error as EngineError;
use serde::Serialize;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, String, Option<String>) {
        match self {
            AppError::Engine(e) => match e {
                EngineError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string(), None),
                EngineError::MalformedImportPayload(msg) => (
                    StatusCode::BAD_REQUEST,
                    "Import failed".to_string(),
                    Some(msg.clone()),
                ),
                EngineError::RemoteUnavailable(msg) => {
                    tracing::warn!("Remote unavailable: {}", msg);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Sync failed".to_string(),
                        Some(msg.clone()),
                    )
                }
                EngineError::Serialization(msg) => {
                    tracing::error!("Serialization error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Serialization error".to_string(),
                        Some(msg.clone()),
                    )
                }
                EngineError::Persistence(msg) => {
                    tracing::error!("Persistence error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Persistence error".to_string(),
                        Some(msg.clone()),
                    )
                }
                EngineError::IndexOutOfBounds { .. } => {
                    tracing::error!("Engine error: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                        None,
                    )
                }
            },
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();
        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use quotesync_engine::Field;

    #[test]
    fn status_codes() {
        let cases = [
            (
                AppError::from(EngineError::Validation(Field::Text)),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(EngineError::MalformedImportPayload("not an array".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(EngineError::RemoteUnavailable("timeout".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::from(EngineError::Persistence("disk full".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::NotFound("nothing".into()), StatusCode::NOT_FOUND),
            (
                AppError::from(EngineError::Serialization("bad float".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Internal("sync task panicked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn validation_message_is_exposed() {
        let error = AppError::from(EngineError::Validation(Field::Category));
        let (_, message, details) = error.parts();
        assert_eq!(message, "validation failed: category must not be empty");
        assert!(details.is_none());
    }
}
