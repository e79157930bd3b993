// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors over the request's [`AuthOutcome`].
//!
//! ```rust,ignore
//! async fn delete_link(AdminOnly { uid }: AdminOnly) -> impl IntoResponse {
//!     // only verified admins reach here
//! }
//! ```
//!
//! Every refusal renders the same generic response; the specific reason is
//! only logged.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::UserId;
use super::outcome::AuthOutcome;
use crate::error::ApiError;
use crate::state::AppState;

/// The request's authorization outcome.
///
/// Uses the outcome stored by the middleware; when the middleware did not
/// run, evaluates it here and stores it so it is computed only once.
pub struct Authorization(pub AuthOutcome);

impl FromRequestParts<AppState> for Authorization {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(outcome) = parts.extensions.get::<AuthOutcome>().cloned() {
            return Ok(Authorization(outcome));
        }

        let outcome = state.auth.build(&parts.headers).await;
        parts.extensions.insert(outcome.clone());
        Ok(Authorization(outcome))
    }
}

/// Extractor that requires a verified admin.
pub struct AdminOnly {
    pub uid: UserId,
}

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Ok(Authorization(outcome)) = Authorization::from_request_parts(parts, state).await;

        match outcome.require_admin() {
            Ok(uid) => Ok(AdminOnly { uid }),
            Err(denial) => {
                tracing::warn!(
                    reason = denial.code(),
                    detail = %denial,
                    path = %parts.uri.path(),
                    "authorization denied"
                );
                Err(ApiError::authorization_denied())
            }
        }
    }
}

/// Extractor for public routes: admits anonymous and authenticated callers,
/// refuses a credential that failed verification.
pub struct PublicAccess(pub AuthOutcome);

impl FromRequestParts<AppState> for PublicAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Ok(Authorization(outcome)) = Authorization::from_request_parts(parts, state).await;

        if let Err(denial) = outcome.require_valid_or_absent() {
            tracing::warn!(
                reason = denial.code(),
                detail = %denial,
                path = %parts.uri.path(),
                "authorization denied"
            );
            return Err(ApiError::authorization_denied());
        }
        Ok(PublicAccess(outcome))
    }
}
