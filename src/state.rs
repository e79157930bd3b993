// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthContextBuilder, IdentityProvider};
use crate::config::AliasPolicy;
use crate::storage::LinkStore;

/// Shared application state. Cheap to clone; nothing in it is mutated per
/// request.
#[derive(Clone)]
pub struct AppState {
    pub links: Arc<dyn LinkStore>,
    pub auth: AuthContextBuilder,
    pub identity: Arc<dyn IdentityProvider>,
    pub alias: AliasPolicy,
}

impl AppState {
    pub fn new(
        links: Arc<dyn LinkStore>,
        auth: AuthContextBuilder,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            links,
            auth,
            identity,
            alias: AliasPolicy::default(),
        }
    }

    pub fn with_alias_policy(mut self, alias: AliasPolicy) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_links(mut self, links: Arc<dyn LinkStore>) -> Self {
        self.links = links;
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::permissions::PermissionProvider;
    use crate::auth::token::tests::SECRET;
    use crate::auth::{IdentityError, PermissionResolver, TokenVerifier, UserId};
    use crate::storage::RedbLinkStore;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Identity authority stand-in with canned answers.
    pub(crate) struct StaticIdentity;

    pub(crate) const KNOWN_EMAIL: &str = "admin@example.com";
    pub(crate) const KNOWN_PASSWORD: &str = "hunter2";
    pub(crate) const ISSUED_TOKEN: &str = "issued.token.value";

    #[async_trait]
    impl IdentityProvider for StaticIdentity {
        async fn register(&self, email: &str, _password: &str) -> Result<UserId, IdentityError> {
            match email {
                KNOWN_EMAIL => Err(IdentityError::AlreadyExists),
                "down@example.com" => Err(IdentityError::Unavailable("refused".into())),
                _ => Ok(101),
            }
        }

        async fn login(
            &self,
            email: &str,
            password: &str,
            _app_id: i32,
        ) -> Result<String, IdentityError> {
            if email == KNOWN_EMAIL && password == KNOWN_PASSWORD {
                Ok(ISSUED_TOKEN.to_string())
            } else {
                Err(IdentityError::InvalidCredentials)
            }
        }
    }

    /// State over a temp redb store, the test secret and `provider`.
    pub(crate) fn test_state(provider: Arc<dyn PermissionProvider>) -> (AppState, TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = RedbLinkStore::open(&dir.path().join("links.redb"), Duration::from_secs(5))
            .expect("Failed to open link store");
        let auth = AuthContextBuilder::new(
            TokenVerifier::new(SECRET),
            PermissionResolver::new(provider, Duration::from_secs(1)),
        );
        let state = AppState::new(Arc::new(store), auth, Arc::new(StaticIdentity));
        (state, dir)
    }
}
