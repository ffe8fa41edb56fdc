// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path layout of the artifact directory.

use std::path::{Path, PathBuf};

use crate::models::ArtifactHash;

/// Default storage root, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "./turbo-cache";

/// Hidden directory holding uploads that have not been published yet.
/// Hashes can never start with `.`, so it cannot collide with an artifact.
pub const STAGING_DIR: &str = ".staging";

/// Storage path utilities for the artifact directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory; artifacts live directly inside it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a published artifact.
    pub fn artifact(&self, hash: &ArtifactHash) -> PathBuf {
        self.root.join(hash.as_str())
    }

    /// Directory for in-flight uploads.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_cache_dir() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("./turbo-cache"));
    }

    #[test]
    fn artifacts_are_flat_under_root() {
        let paths = StoragePaths::new("/tmp/test-cache");
        let hash = ArtifactHash::parse("abc123").unwrap();
        assert_eq!(
            paths.artifact(&hash),
            PathBuf::from("/tmp/test-cache/abc123")
        );
    }

    #[test]
    fn staging_dir_is_hidden() {
        let paths = StoragePaths::new("/tmp/test-cache");
        assert_eq!(
            paths.staging_dir(),
            PathBuf::from("/tmp/test-cache/.staging")
        );
    }
}
