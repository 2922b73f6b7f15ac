//! Error responses of the depiction service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The structure could not be parsed or drawn
    #[error("{0}")]
    BadRequest(String),

    /// The request itself is malformed (missing or unparsable parameters)
    #[error("{0}")]
    Unprocessable(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(msg) => {
                log::debug!("Rejected structure: {}", msg);
                StatusCode::BAD_REQUEST
            }
            ApiError::Unprocessable(msg) => {
                log::debug!("Rejected request: {}", msg);
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        let body = Json(ErrorResponse {
            detail: self.to_string(),
        });
        (status, body).into_response()
    }
}
