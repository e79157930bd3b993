// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded link database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `links`: alias → serialized StoredLink
//! - `sequences`: sequence name → last issued id
//!
//! redb admits one write transaction at a time, which makes the
//! check-then-insert in [`LinkDatabase::insert`] atomic.

use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::StoredLink;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: alias → serialized StoredLink (JSON bytes).
const LINKS: TableDefinition<&str, &[u8]> = TableDefinition::new("links");

/// Monotonic id sequences: name → last issued value.
const SEQUENCES: TableDefinition<&str, i64> = TableDefinition::new("sequences");

const LINK_ID_SEQUENCE: &str = "link_id";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LinkDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("alias already exists: {0}")]
    AliasExists(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type LinkDbResult<T> = Result<T, LinkDbError>;

// =============================================================================
// LinkDatabase
// =============================================================================

/// Embedded ACID link database.
pub struct LinkDatabase {
    db: Database,
}

impl LinkDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LinkDbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Read transactions fail on tables that were never created.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(LINKS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert a link under `alias`, allocating the next id.
    ///
    /// Fails with [`LinkDbError::AliasExists`] without side effects when the
    /// alias is taken.
    pub fn insert(&self, url: &str, alias: &str) -> LinkDbResult<StoredLink> {
        let write_txn = self.db.begin_write()?;
        let link = {
            let mut links = write_txn.open_table(LINKS)?;
            if links.get(alias)?.is_some() {
                return Err(LinkDbError::AliasExists(alias.to_string()));
            }

            let mut sequences = write_txn.open_table(SEQUENCES)?;
            let last = sequences
                .get(LINK_ID_SEQUENCE)?
                .map(|v| v.value())
                .unwrap_or(0);
            let id = last + 1;
            sequences.insert(LINK_ID_SEQUENCE, id)?;

            let link = StoredLink {
                id,
                alias: alias.to_string(),
                url: url.to_string(),
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&link)?;
            links.insert(alias, json.as_slice())?;
            link
        };
        write_txn.commit()?;
        Ok(link)
    }

    /// Look up a link by alias.
    pub fn get(&self, alias: &str) -> LinkDbResult<Option<StoredLink>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LINKS)?;
        match table.get(alias)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Remove a link, returning the removed row.
    pub fn remove(&self, alias: &str) -> LinkDbResult<StoredLink> {
        let write_txn = self.db.begin_write()?;
        let link = {
            let mut table = write_txn.open_table(LINKS)?;
            let removed = table
                .remove(alias)?
                .ok_or_else(|| LinkDbError::NotFound(format!("Link {alias}")))?;
            serde_json::from_slice::<StoredLink>(removed.value())?
        };
        write_txn.commit()?;
        Ok(link)
    }
}

#[cfg(test)]
impl LinkDatabase {
    fn len(&self) -> LinkDbResult<u64> {
        use redb::ReadableTableMetadata;

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LINKS)?;
        Ok(table.len()?)
    }

    fn is_empty(&self) -> LinkDbResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Last id handed out by the sequence (0 if none).
    fn last_id(&self) -> LinkDbResult<super::LinkId> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCES)?;
        Ok(table.get(LINK_ID_SEQUENCE)?.map(|v| v.value()).unwrap_or(0))
    }
}

// =============================================================================
// Tests
// =============================================================================
