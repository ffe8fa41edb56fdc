// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Artifact Storage Module
//!
//! Content-addressed blob storage for cache artifacts. The module owns the
//! storage directory; nothing else in the crate touches it.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//!   {hash}          # one file per artifact, raw bytes as uploaded
//!   .staging/
//!     upload-*.tmp  # in-flight uploads, renamed into place on success
//! ```
//!
//! ## Important Notes
//!
//! - Hashes reach this module only as validated [`ArtifactHash`] values
//! - No metadata files, no sharding, no expiry
//!
//! [`ArtifactHash`]: crate::models::ArtifactHash

pub mod artifact_store;
pub mod filesystem;
pub mod paths;

pub use artifact_store::{
    ArtifactReader, ArtifactStore, StorageError, StorageResult, StoredArtifact,
};
pub use filesystem::FileSystemStore;
pub use paths::StoragePaths;
