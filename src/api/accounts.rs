// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login, passed through to the identity authority.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{
    error::ApiError,
    models::{
        ErrorResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
        ResponseStatus,
    },
    state::AppState,
};

fn decode<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "failed to decode request body");
        ApiError::bad_request("failed to decode request body")
    })
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!(
            "field {field} is a required field"
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    tag = "Accounts",
    responses(
        (status = 200, body = RegisterResponse),
        (status = 400, body = ErrorResponse),
        (status = 409, body = ErrorResponse, description = "User already exists"),
        (status = 502, body = ErrorResponse, description = "Identity authority unavailable")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let request = decode(body)?;
    require("email", &request.email)?;
    require("password", &request.password)?;

    let user_id = state
        .identity
        .register(&request.email, &request.password)
        .await?;

    tracing::info!(user_id, "user registered");
    Ok(Json(RegisterResponse {
        status: ResponseStatus::Ok,
        user_id,
    }))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    tag = "Accounts",
    responses(
        (status = 200, body = LoginResponse),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse, description = "Invalid credentials"),
        (status = 502, body = ErrorResponse, description = "Identity authority unavailable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = decode(body)?;
    require("email", &request.email)?;
    require("password", &request.password)?;

    let token = state
        .identity
        .login(&request.email, &request.password, request.app_id)
        .await?;

    tracing::info!(app_id = request.app_id, "user logged in");
    Ok(Json(LoginResponse {
        status: ResponseStatus::Ok,
        token,
    }))
}
