use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid body")]
    InvalidBody,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Missing required fields: daily_stats, ach_state")]
    MissingFields,

    #[error("Invalid {0}")]
    InvalidField(&'static str),

    #[error("{field} too long (max {max})")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Avatar too large (max ~100KB)")]
    AvatarTooLarge,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Corrupted data")]
    CorruptedData,

    #[error("Internal error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidBody
            | AppError::InvalidJson
            | AppError::MissingFields
            | AppError::InvalidField(_)
            | AppError::FieldTooLong { .. } => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge | AppError::AvatarTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::CorruptedData | AppError::Store(..) | AppError::Serialize(..) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
