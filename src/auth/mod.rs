// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Shared-secret bearer authentication for the remote cache API.
//!
//! ## Auth Flow
//!
//! 1. `turbo` is configured with the same token the server was started with
//! 2. Every cache request carries `Authorization: Bearer <token>`
//! 3. The middleware compares the token with the configured secret in
//!    constant time and answers 401 before any handler runs on mismatch
//!
//! There is one token per process, fixed at startup. No team scoping, no
//! expiry.

pub mod error;
pub mod middleware;

pub use error::AuthError;
pub use middleware::{authorize, is_protected, require_bearer_token, PROTECTED_PREFIX};
