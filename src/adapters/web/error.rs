//! HTTP error responses for the web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::error::FoliovalError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<FoliovalError> for ApiError {
    fn from(err: FoliovalError) -> Self {
        let status = match &err {
            FoliovalError::InvalidTransaction { .. }
            | FoliovalError::UnknownRange { .. }
            | FoliovalError::UnknownResolution { .. }
            | FoliovalError::InvalidInstant { .. }
            | FoliovalError::InvalidWindow { .. }
            | FoliovalError::ConfigParse { .. }
            | FoliovalError::ConfigMissing { .. }
            | FoliovalError::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
            FoliovalError::UnknownInstrument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            FoliovalError::Store { .. }
            | FoliovalError::StoreQuery { .. }
            | FoliovalError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
