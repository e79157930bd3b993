// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! URL Shortener - Alias Service
//!
//! Maps short aliases to destination URLs. Creating and deleting aliases is
//! reserved to admins, as decided by an external identity authority; resolving
//! an alias is public.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and router (Axum)
//! - `auth` - Bearer token verification and admin resolution
//! - `alias` - Alias generation and validation
//! - `storage` - Link store backed by redb
//! - `sso` - HTTP client for the identity authority

pub mod alias;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod sso;
pub mod state;
pub mod storage;
pub mod telemetry;
