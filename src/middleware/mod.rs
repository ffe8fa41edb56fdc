// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Middleware Stack
//!
//! - [`request_log`]: one access-log event per request.
//!
//! Bearer authentication lives in [`crate::auth`].

pub mod request_log;

pub use request_log::log_requests;
