// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage contract shared by the HTTP handlers.

use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::models::ArtifactHash;

/// Error type for artifact storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No artifact is stored under the hash.
    #[error("artifact not found: {0}")]
    NotFound(String),
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A blocking task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Internal(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Readable artifact payload.
pub type ArtifactReader = Pin<Box<dyn AsyncRead + Send>>;

/// Handle to a stored artifact, returned by [`ArtifactStore::retrieve`].
pub struct StoredArtifact {
    pub reader: ArtifactReader,
    /// Exact payload length in bytes.
    pub size: u64,
}

impl std::fmt::Debug for StoredArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredArtifact")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Content-addressed blob storage.
///
/// Implementations must never expose a partially written payload: a failed
/// or abandoned `store` leaves the previous content (or nothing) in place.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist `body` under `hash`, replacing any previous payload.
    /// Returns the number of bytes written.
    async fn store(
        &self,
        hash: &ArtifactHash,
        body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64>;

    /// Open the payload stored under `hash`.
    async fn retrieve(&self, hash: &ArtifactHash) -> StorageResult<StoredArtifact>;

    /// Whether a payload is stored under `hash`. Reads no payload bytes.
    async fn exists(&self, hash: &ArtifactHash) -> StorageResult<bool>;

    /// Verify the backing storage is usable.
    async fn health_check(&self) -> StorageResult<()>;
}
