// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Link Storage
//!
//! Durable alias → destination mapping. Alias uniqueness is enforced inside
//! the storage layer: `create` checks and inserts within one serialized write
//! transaction, so two concurrent creates for the same alias always yield one
//! success and one [`StoreError::AliasConflict`].
//!
//! ## Layout
//!
//! ```text
//! links.redb
//!   links:     alias → StoredLink (JSON)
//!   sequences: name  → last issued id
//! ```

pub mod link_database;
pub mod link_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use link_database::{LinkDatabase, LinkDbError};
pub use link_store::RedbLinkStore;

/// Store-assigned link identifier.
pub type LinkId = i64;

/// A persisted link. Never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredLink {
    pub id: LinkId,
    pub alias: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another link already owns this alias.
    #[error("alias {0:?} already exists")]
    AliasConflict(String),

    /// No link with this alias.
    #[error("alias {0:?} not found")]
    NotFound(String),

    /// The operation did not finish within its deadline. It may still have
    /// taken effect.
    #[error("store operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Alias → URL storage contract.
///
/// Every operation touches a single alias and runs as one atomic unit.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Insert a new link. Fails with `AliasConflict` if the alias is taken.
    async fn create(&self, url: &str, alias: &str) -> StoreResult<LinkId>;

    /// Resolve an alias to its destination URL.
    async fn lookup(&self, alias: &str) -> StoreResult<String>;

    /// Remove a link, returning the id it had.
    async fn delete(&self, alias: &str) -> StoreResult<LinkId>;
}
