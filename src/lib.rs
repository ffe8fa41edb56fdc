// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Turborepo Remote Cache - self-hosted `/v8/artifacts` server
//!
//! Stores build artifacts produced by Turborepo clients on the local
//! filesystem, keyed by content hash, behind a single shared bearer token.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Bearer token authentication
//! - `config` - Environment configuration
//! - `middleware` - Access logging
//! - `storage` - Artifact persistence (filesystem)
//! - `telemetry` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod state;
pub mod storage;
pub mod telemetry;
