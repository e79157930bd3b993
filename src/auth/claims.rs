// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims issued by the identity authority.

use serde::{Deserialize, Serialize};

/// Numeric subject identifier assigned by the identity authority.
pub type UserId = i64;

/// Claims carried by bearer tokens.
///
/// Decoding fails when `uid` is absent or not an integer, so a token that
/// verifies but lacks a usable subject is rejected as invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub uid: UserId,

    /// Email the token was issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Application the token was issued for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<i32>,

    /// Expiration timestamp (checked when present)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl Claims {
    pub fn new(uid: UserId) -> Self {
        Self {
            uid,
            email: None,
            app_id: None,
            exp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_claims() {
        let claims: Claims = serde_json::from_str(r#"{"uid":42}"#).unwrap();
        assert_eq!(claims, Claims::new(42));
    }

    #[test]
    fn ignores_unknown_fields() {
        let claims: Claims = serde_json::from_str(
            r#"{"uid":7,"email":"a@b.c","app_id":1,"exp":9999999999,"role":"x"}"#,
        )
        .unwrap();
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
        assert_eq!(claims.app_id, Some(1));
    }

    #[test]
    fn rejects_missing_or_mistyped_uid() {
        assert!(serde_json::from_str::<Claims>(r#"{"email":"a@b.c"}"#).is_err());
        assert!(serde_json::from_str::<Claims>(r#"{"uid":"42"}"#).is_err());
        assert!(serde_json::from_str::<Claims>(r#"{"uid":4.5}"#).is_err());
        assert!(serde_json::from_str::<Claims>(r#"{"uid":null}"#).is_err());
    }
}
