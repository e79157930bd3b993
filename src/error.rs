// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::IdentityError;
use crate::models::ErrorResponse;
use crate::storage::StoreError;

/// Client-facing error. Rendered as `{"status":"Error","error":...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// The one response for every authorization failure.
    pub fn authorization_denied() -> Self {
        Self::new(StatusCode::FORBIDDEN, "authorization error")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }

    pub fn bad_gateway() -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "identity service unavailable")
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AliasConflict(_) => ApiError::conflict("alias already exists"),
            StoreError::NotFound(_) => ApiError::not_found("url not found"),
            StoreError::Timeout(_) | StoreError::Unavailable(_) => {
                tracing::error!(error = %err, "link store failure");
                ApiError::internal()
            }
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => ApiError::unauthorized("invalid credentials"),
            IdentityError::AlreadyExists => ApiError::conflict("user already exists"),
            IdentityError::Unavailable(_) => {
                tracing::error!(error = %err, "identity authority failure");
                ApiError::bad_gateway()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.message));
        (self.status, body).into_response()
    }
}
