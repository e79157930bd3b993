// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin privilege resolution against the identity authority.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::claims::UserId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// The authority could not be reached or failed internally.
    #[error("permission authority unavailable: {0}")]
    Unavailable(String),

    /// The authority answered but refused the query.
    #[error("permission authority rejected the query: {0}")]
    Rejected(String),

    #[error("permission check timed out after {0:?}")]
    Timeout(Duration),
}

/// External system of record for admin privilege.
///
/// Implementations own transport concerns such as retries.
#[async_trait]
pub trait PermissionProvider: Send + Sync + 'static {
    async fn is_admin(&self, uid: UserId) -> Result<bool, PermissionError>;
}

/// Maps a provider call into a privilege answer under a deadline.
///
/// Never retries; a single failure is final for the request.
#[derive(Clone)]
pub struct PermissionResolver {
    provider: Arc<dyn PermissionProvider>,
    deadline: Duration,
}

impl PermissionResolver {
    pub fn new(provider: Arc<dyn PermissionProvider>, deadline: Duration) -> Self {
        Self { provider, deadline }
    }

    pub async fn resolve(&self, uid: UserId) -> Result<bool, PermissionError> {
        match tokio::time::timeout(self.deadline, self.provider.is_admin(uid)).await {
            Ok(result) => result,
            Err(_) => Err(PermissionError::Timeout(self.deadline)),
        }
    }
}
