// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Alias generation and validation.
//!
//! Generated aliases carry no uniqueness guarantee. The link store arbitrates
//! collisions; callers that generated the alias regenerate on conflict.

use rand::Rng;

/// Alphabet for generated aliases (62 symbols).
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Longest alias accepted from callers.
pub const MAX_ALIAS_LEN: usize = 64;

/// Names that would shadow a fixed route.
const RESERVED: &[&str] = &["url", "register", "login", "health", "docs", "api-doc"];

/// Draw a `length`-character alias from `rng`.
pub fn allocate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Draw a `length`-character alias from the thread-local generator.
pub fn allocate(length: usize) -> String {
    allocate_with(&mut rand::thread_rng(), length)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AliasError {
    #[error("alias must be between 1 and {MAX_ALIAS_LEN} characters")]
    Length,
    #[error("alias may only contain letters, digits, '-' and '_'")]
    Charset,
    #[error("alias {0:?} is reserved")]
    Reserved(String),
}

/// Check a caller-supplied alias.
pub fn validate(alias: &str) -> Result<(), AliasError> {
    if alias.is_empty() || alias.len() > MAX_ALIAS_LEN {
        return Err(AliasError::Length);
    }
    if !alias
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(AliasError::Charset);
    }
    if RESERVED.contains(&alias) {
        return Err(AliasError::Reserved(alias.to_string()));
    }
    Ok(())
}
