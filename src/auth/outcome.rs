// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request authorization outcome.

use super::claims::UserId;
use super::permissions::PermissionError;
use super::token::TokenError;

/// The single authorization result attached to a request.
///
/// Set once by the authorization layer and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No credential was presented.
    Anonymous,
    /// Credential verified and privilege resolved.
    Authenticated { uid: UserId, is_admin: bool },
    /// A credential was presented but failed verification.
    Invalid { reason: TokenError },
    /// Credential verified but the authority could not answer.
    ResolverFailed { uid: UserId, reason: PermissionError },
}

/// Why an admin-only operation was refused. Server-side only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("no credential presented")]
    Anonymous,
    #[error("invalid token: {0}")]
    InvalidToken(TokenError),
    #[error("permission check failed for uid {uid}: {reason}")]
    ResolverUnavailable { uid: UserId, reason: PermissionError },
    #[error("uid {0} is not an admin")]
    NotAdmin(UserId),
}

impl Denial {
    /// Stable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Denial::Anonymous => "anonymous",
            Denial::InvalidToken(reason) => reason.code(),
            Denial::ResolverUnavailable { .. } => "resolver_unavailable",
            Denial::NotAdmin(_) => "not_admin",
        }
    }
}

impl AuthOutcome {
    /// Admit only verified admins, returning their uid.
    pub fn require_admin(&self) -> Result<UserId, Denial> {
        match self {
            AuthOutcome::Authenticated {
                uid,
                is_admin: true,
            } => Ok(*uid),
            AuthOutcome::Authenticated {
                uid,
                is_admin: false,
            } => Err(Denial::NotAdmin(*uid)),
            AuthOutcome::Anonymous => Err(Denial::Anonymous),
            AuthOutcome::Invalid { reason } => Err(Denial::InvalidToken(reason.clone())),
            AuthOutcome::ResolverFailed { uid, reason } => Err(Denial::ResolverUnavailable {
                uid: *uid,
                reason: reason.clone(),
            }),
        }
    }

    /// Public routes admit everything except a bad credential.
    pub fn require_valid_or_absent(&self) -> Result<(), Denial> {
        match self {
            AuthOutcome::Invalid { reason } => Err(Denial::InvalidToken(reason.clone())),
            _ => Ok(()),
        }
    }

    /// The uid, only when it was fully resolved.
    pub fn uid(&self) -> Option<UserId> {
        match self {
            AuthOutcome::Authenticated { uid, .. } => Some(*uid),
            _ => None,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthOutcome::Anonymous => "anonymous",
            AuthOutcome::Authenticated { is_admin: true, .. } => "admin",
            AuthOutcome::Authenticated { is_admin: false, .. } => "user",
            AuthOutcome::Invalid { .. } => "invalid",
            AuthOutcome::ResolverFailed { .. } => "resolver_failed",
        }
    }
}
