// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization middleware for Axum.
//!
//! Builds exactly one [`AuthOutcome`] per request and stores it in the
//! request extensions, where the extractors in `extractor.rs` pick it up.
//!
//! ```text
//! no credential ───────────────────────────────▶ Anonymous
//! credential ── verify ✗ ──────────────────────▶ Invalid
//!            └─ verify ✓ ── resolve ✓ ──────────▶ Authenticated
//!                        └─ resolve ✗ ──────────▶ ResolverFailed
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use super::outcome::AuthOutcome;
use super::permissions::PermissionResolver;
use super::token::{bearer_token, TokenVerifier};
use crate::state::AppState;

/// Composes token verification and privilege resolution.
#[derive(Clone)]
pub struct AuthContextBuilder {
    verifier: Arc<TokenVerifier>,
    resolver: PermissionResolver,
}

impl AuthContextBuilder {
    pub fn new(verifier: TokenVerifier, resolver: PermissionResolver) -> Self {
        Self {
            verifier: Arc::new(verifier),
            resolver,
        }
    }

    /// Evaluate request headers into an outcome. Never fails.
    ///
    /// The authority is consulted only for verified credentials.
    pub async fn build(&self, headers: &HeaderMap) -> AuthOutcome {
        let Some(token) = bearer_token(headers) else {
            return AuthOutcome::Anonymous;
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(reason) => {
                tracing::warn!(reason = reason.code(), error = %reason, "failed to verify token");
                return AuthOutcome::Invalid { reason };
            }
        };

        match self.resolver.resolve(claims.uid).await {
            Ok(is_admin) => {
                tracing::debug!(uid = claims.uid, is_admin, "user authorized");
                AuthOutcome::Authenticated {
                    uid: claims.uid,
                    is_admin,
                }
            }
            Err(reason) => {
                tracing::error!(uid = claims.uid, error = %reason, "failed to check if user is admin");
                AuthOutcome::ResolverFailed {
                    uid: claims.uid,
                    reason,
                }
            }
        }
    }
}

/// Attach the request's [`AuthOutcome`] unless one is already present.
pub async fn authorize(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthOutcome>().is_none() {
        let outcome = state.auth.build(request.headers()).await;
        request.extensions_mut().insert(outcome);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::tests::StaticProvider;
    use crate::auth::permissions::{PermissionError, PermissionProvider};
    use crate::auth::token::tests::{sign, SECRET};
    use crate::auth::token::TokenError;
    use axum::http::{header::AUTHORIZATION, HeaderValue};
    use serde_json::json;
    use std::time::Duration;

    fn builder(provider: Arc<dyn PermissionProvider>) -> AuthContextBuilder {
        AuthContextBuilder::new(
            TokenVerifier::new(SECRET),
            PermissionResolver::new(provider, Duration::from_secs(1)),
        )
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn no_header_is_anonymous_without_authority_call() {
        let provider = StaticProvider::admin();
        let outcome = builder(provider.clone()).build(&HeaderMap::new()).await;
        assert_eq!(outcome, AuthOutcome::Anonymous);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn wrong_scheme_is_anonymous() {
        let provider = StaticProvider::admin();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        let outcome = builder(provider.clone()).build(&headers).await;
        assert_eq!(outcome, AuthOutcome::Anonymous);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn bad_signature_is_invalid_not_anonymous() {
        let provider = StaticProvider::admin();
        let token = sign(&json!({"uid": 1}), b"forged");
        let outcome = builder(provider.clone()).build(&bearer(&token)).await;
        assert_eq!(
            outcome,
            AuthOutcome::Invalid {
                reason: TokenError::InvalidSignature
            }
        );
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn missing_uid_is_invalid() {
        let provider = StaticProvider::admin();
        let token = sign(&json!({"email": "a@b.c"}), SECRET);
        let outcome = builder(provider.clone()).build(&bearer(&token)).await;
        assert!(matches!(outcome, AuthOutcome::Invalid { .. }));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn verified_token_resolves_privilege_once() {
        let provider = StaticProvider::user();
        let token = sign(&json!({"uid": 9}), SECRET);
        let outcome = builder(provider.clone()).build(&bearer(&token)).await;
        assert_eq!(
            outcome,
            AuthOutcome::Authenticated {
                uid: 9,
                is_admin: false
            }
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn resolver_failure_is_reported() {
        let provider = StaticProvider::failing();
        let token = sign(&json!({"uid": 5}), SECRET);
        let outcome = builder(provider.clone()).build(&bearer(&token)).await;
        assert!(matches!(
            outcome,
            AuthOutcome::ResolverFailed {
                uid: 5,
                reason: PermissionError::Unavailable(_)
            }
        ));
        assert_eq!(provider.calls(), 1);
    }
}
