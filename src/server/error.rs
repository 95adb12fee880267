//! Error replies of the chat endpoint.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{ IntoResponse, Response },
    Json,
};
use log::error;
use thiserror::Error;

use crate::dataset::MatchError;
use crate::models::chat::ErrorResponse;

pub type ApiResult<T> = Result<T, ApiError>;

/// The `Display` text of each variant is exactly what the client sees.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No input provided")]
    EmptyInput,

    #[error("Invalid JSON structure in request.")]
    InvalidRequest(#[from] JsonRejection),

    /// A dataset record reached by the scan lacks a required key.
    #[error("Invalid JSON structure in request.")]
    MalformedRecord(MatchError),

    #[error("An unexpected error occurred. Please try again later.")]
    Internal(String),
}

impl From<MatchError> for ApiError {
    fn from(e: MatchError) -> Self {
        match e {
            MatchError::MalformedRecord { .. } => ApiError::MalformedRecord(e),
            MatchError::MissingReply { .. } => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::EmptyInput => StatusCode::BAD_REQUEST,
            ApiError::InvalidRequest(rejection) => {
                error!("Invalid JSON structure in request: {}", rejection.body_text());
                StatusCode::BAD_REQUEST
            }
            ApiError::MalformedRecord(e) => {
                error!("Invalid JSON structure in dataset: {}", e);
                StatusCode::BAD_REQUEST
            }
            ApiError::Internal(detail) => {
                error!("An error occurred: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorResponse { error: self.to_string() });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_detail_is_never_echoed() {
        let err = ApiError::from(MatchError::MissingReply { index: 3 });
        assert_eq!(err.to_string(), "An unexpected error occurred. Please try again later.");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn malformed_record_maps_to_structural_error() {
        let err = ApiError::from(MatchError::MalformedRecord { index: 0, key: "role" });
        assert_eq!(err.to_string(), "Invalid JSON structure in request.");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_input_is_a_client_error() {
        assert_eq!(ApiError::EmptyInput.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
