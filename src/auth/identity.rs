// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account registration and token issuance, owned by the identity authority.

use async_trait::async_trait;

use super::claims::UserId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    AlreadyExists,

    #[error("identity authority unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Create an account, returning its user id.
    async fn register(&self, email: &str, password: &str) -> Result<UserId, IdentityError>;

    /// Exchange credentials for a signed bearer token.
    async fn login(&self, email: &str, password: &str, app_id: i32)
        -> Result<String, IdentityError>;
}
