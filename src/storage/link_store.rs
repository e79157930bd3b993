// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Async [`LinkStore`] over the blocking redb database.
//!
//! Each call runs on the blocking pool under a deadline. A timed-out call is
//! reported as [`StoreError::Timeout`] but the write may still commit.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{LinkDatabase, LinkDbError, LinkId, LinkStore, StoreError, StoreResult};

#[derive(Clone)]
pub struct RedbLinkStore {
    db: Arc<LinkDatabase>,
    timeout: Duration,
}

impl RedbLinkStore {
    pub fn new(db: LinkDatabase, timeout: Duration) -> Self {
        Self {
            db: Arc::new(db),
            timeout,
        }
    }

    /// Open the database file and wrap it.
    pub fn open(path: &Path, timeout: Duration) -> Result<Self, LinkDbError> {
        Ok(Self::new(LinkDatabase::open(path)?, timeout))
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&LinkDatabase) -> Result<T, LinkDbError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let task = tokio::task::spawn_blocking(move || op(&db));
        match tokio::time::timeout(self.timeout, task).await {
            Err(_) => Err(StoreError::Timeout(self.timeout)),
            Ok(Err(join_err)) => Err(StoreError::Unavailable(join_err.to_string())),
            Ok(Ok(result)) => result.map_err(StoreError::from),
        }
    }
}

impl From<LinkDbError> for StoreError {
    fn from(err: LinkDbError) -> Self {
        match err {
            LinkDbError::AliasExists(alias) => StoreError::AliasConflict(alias),
            LinkDbError::NotFound(what) => StoreError::NotFound(what),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl LinkStore for RedbLinkStore {
    async fn create(&self, url: &str, alias: &str) -> StoreResult<LinkId> {
        let (url, alias) = (url.to_string(), alias.to_string());
        self.run(move |db| db.insert(&url, &alias).map(|link| link.id))
            .await
    }

    async fn lookup(&self, alias: &str) -> StoreResult<String> {
        let key = alias.to_string();
        match self.run(move |db| db.get(&key)).await? {
            Some(link) => Ok(link.url),
            None => Err(StoreError::NotFound(alias.to_string())),
        }
    }

    async fn delete(&self, alias: &str) -> StoreResult<LinkId> {
        let key = alias.to_string();
        self.run(move |db| db.remove(&key).map(|link| link.id))
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => StoreError::NotFound(alias.to_string()),
                other => other,
            })
    }
}
