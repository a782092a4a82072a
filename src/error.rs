use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, From};
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug, Display, From)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    NotFound(String),
    #[display(fmt = "attendance could not be saved: {}", _0)]
    Persistence(StoreError),
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Internal(String),
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // details stay in the log
            ApiError::Persistence(_) => "Attendance could not be saved".to_string(),
            ApiError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}
