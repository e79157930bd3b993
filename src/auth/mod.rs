// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Module
//!
//! Bearer-token authorization for the URL shortener.
//!
//! ## Auth Flow
//!
//! 1. Client logs in through `POST /login`; the identity authority issues
//!    an HS256 token carrying a numeric `uid`
//! 2. Client sends `Authorization: Bearer <token>`
//! 3. Server:
//!    - Verifies the signature with `APP_SECRET`
//!    - Extracts `uid` (a missing or non-integer `uid` invalidates the token)
//!    - Asks the authority whether `uid` is an admin
//!    - Stores the resulting [`AuthOutcome`] on the request
//!
//! ## Policy
//!
//! - Mutating endpoints require `Authenticated { is_admin: true }`
//! - Redirects admit anonymous callers but refuse invalid tokens
//! - Every refusal looks the same to the caller; reasons are only logged

pub mod claims;
pub mod extractor;
pub mod identity;
pub mod middleware;
pub mod outcome;
pub mod permissions;
pub mod token;

pub use claims::{Claims, UserId};
pub use extractor::{AdminOnly, Authorization, PublicAccess};
pub use identity::{IdentityError, IdentityProvider};
pub use middleware::{authorize, AuthContextBuilder};
pub use outcome::{AuthOutcome, Denial};
pub use permissions::{PermissionError, PermissionProvider, PermissionResolver};
pub use token::{bearer_token, TokenError, TokenVerifier};
