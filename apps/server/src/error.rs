// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No {0} provided")]
    EmptyPayload(&'static str),

    #[error("Invalid {what}: {message}")]
    InvalidPayload { what: &'static str, message: String },

    #[error("Invalid mesh name: {0:?}")]
    InvalidMeshName(String),

    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("No image file part in the request")]
    MissingFile,

    #[error("Unsupported file extension")]
    UnsupportedExtension,

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::EmptyPayload(_) => (StatusCode::BAD_REQUEST, "EMPTY_PAYLOAD"),
            ApiError::InvalidPayload { .. } => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
            ApiError::InvalidMeshName(_) => (StatusCode::BAD_REQUEST, "INVALID_MESH_NAME"),
            ApiError::InvalidFilename(_) => (StatusCode::BAD_REQUEST, "INVALID_FILENAME"),
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ApiError::UnsupportedExtension => (StatusCode::BAD_REQUEST, "UNSUPPORTED_EXTENSION"),
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MULTIPART_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}
