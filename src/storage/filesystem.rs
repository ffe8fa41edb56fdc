// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem-backed artifact store.
//!
//! ## Write Path
//!
//! Uploads are streamed into a named temp file under `<root>/.staging`,
//! flushed and synced, then renamed over `<root>/<hash>`, and the root
//! directory is synced so the rename survives a crash. The rename is the
//! publish step, so readers only ever see a complete old or complete new
//! payload. If the copy fails, or the request future is dropped mid-upload,
//! the [`tempfile::NamedTempFile`] guard deletes the partial file.
//!
//! Blocking calls (temp file creation, rename) run on tokio's blocking pool;
//! everything else goes through `tokio::fs`, which does the same internally.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::task;
use tracing::{debug, info, warn};

use super::{ArtifactStore, StorageError, StoragePaths, StorageResult, StoredArtifact};
use crate::models::ArtifactHash;

/// Artifact store over a single flat directory.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    paths: StoragePaths,
}

impl FileSystemStore {
    /// Open (and create if needed) the storage root.
    ///
    /// Leftover staging files from a previous run are removed; they can only
    /// be uploads that never completed.
    pub async fn open(paths: StoragePaths) -> StorageResult<Self> {
        fs::create_dir_all(paths.root()).await?;
        fs::create_dir_all(paths.staging_dir()).await?;

        let store = Self { paths };
        let swept = store.sweep_staging().await?;

        info!(
            root = %store.paths.root().display(),
            swept_uploads = swept,
            "Artifact store initialized"
        );

        Ok(store)
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    async fn sweep_staging(&self) -> StorageResult<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(self.paths.staging_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove stale upload"
                ),
            }
        }
        Ok(removed)
    }
}

/// Make a rename inside `dir` durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

/// Directory handles cannot be synced on this platform; the rename is
/// flushed by the filesystem.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn join_error(e: task::JoinError) -> StorageError {
    StorageError::Internal(e.to_string())
}

#[async_trait]
impl ArtifactStore for FileSystemStore {
    async fn store(
        &self,
        hash: &ArtifactHash,
        body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        let staging = self.paths.staging_dir();
        let temp = task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("upload-")
                .suffix(".tmp")
                .tempfile_in(staging)
        })
        .await
        .map_err(join_error)??;

        let mut file = fs::File::from_std(temp.reopen()?);
        let written = tokio::io::copy(body, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let dest = self.paths.artifact(hash);
        let root = self.paths.root().to_path_buf();
        task::spawn_blocking(move || -> io::Result<()> {
            temp.persist(dest).map_err(|e| e.error)?;
            sync_dir(&root)
        })
        .await
        .map_err(join_error)??;

        debug!(%hash, size = written, "Artifact stored");
        Ok(written)
    }

    async fn retrieve(&self, hash: &ArtifactHash) -> StorageResult<StoredArtifact> {
        let file = match fs::File::open(self.paths.artifact(hash)).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(hash.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(hash.to_string()));
        }

        Ok(StoredArtifact {
            reader: Box::pin(file),
            size: metadata.len(),
        })
    }

    async fn exists(&self, hash: &ArtifactHash) -> StorageResult<bool> {
        match fs::metadata(self.paths.artifact(hash)).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> StorageResult<()> {
        for dir in [self.paths.root().to_path_buf(), self.paths.staging_dir()] {
            let metadata = fs::metadata(&dir).await?;
            if !metadata.is_dir() {
                return Err(StorageError::Io(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", dir.display()),
                )));
            }
        }
        Ok(())
    }
}
