// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the Turborepo remote cache protocol
//! (`/v8/artifacts`). Field names follow the wire format the `turbo` client
//! speaks, so most structs rename to camelCase.
//!
//! ## Artifact Hash Type
//!
//! The [`ArtifactHash`] newtype is the only way a client-supplied hash reaches
//! the storage layer. Parsing rejects anything that could escape the storage
//! root (path separators, `..`, leading dots, empty strings).

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

// =============================================================================
// Artifact Hash Type
// =============================================================================

/// Longest hash accepted from a client.
pub const MAX_HASH_LEN: usize = 256;

/// Validated artifact identifier.
///
/// Turborepo sends 16-character hex digests, but the server treats the value
/// as opaque and only constrains it to a filesystem-safe alphabet:
/// ASCII letters, digits, `-`, `_` and `.`, never starting with `.`.
///
/// # Example
///
/// ```rust,ignore
/// let hash: ArtifactHash = "abc123".parse()?;
/// ```
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ArtifactHash(String);

/// Reason a hash was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArtifactHash {
    #[error("artifact hash is empty")]
    Empty,
    #[error("artifact hash exceeds {max} characters", max = MAX_HASH_LEN)]
    TooLong,
    #[error("artifact hash must not start with '.'")]
    LeadingDot,
    #[error("artifact hash contains invalid character {0:?}")]
    InvalidChar(char),
}

impl ArtifactHash {
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidArtifactHash> {
        let value = value.into();
        if value.is_empty() {
            return Err(InvalidArtifactHash::Empty);
        }
        if value.len() > MAX_HASH_LEN {
            return Err(InvalidArtifactHash::TooLong);
        }
        if value.starts_with('.') {
            return Err(InvalidArtifactHash::LeadingDot);
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(InvalidArtifactHash::InvalidChar(c));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArtifactHash {
    type Err = InvalidArtifactHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Cache Events
// =============================================================================

/// Where the client observed the cache result.
///
/// Values other than `LOCAL` and `REMOTE` are kept verbatim in `Other`;
/// a client sending a newer source must not lose its whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CacheSource {
    Local,
    Remote,
    Other(String),
}

impl Default for CacheSource {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for CacheSource {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "LOCAL" => Self::Local,
            "REMOTE" => Self::Remote,
            _ => Self::Other(value),
        }
    }
}

impl From<CacheSource> for String {
    fn from(source: CacheSource) -> Self {
        match source {
            CacheSource::Local => "LOCAL".to_string(),
            CacheSource::Remote => "REMOTE".to_string(),
            CacheSource::Other(value) => value,
        }
    }
}

impl std::fmt::Display for CacheSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheSource::Local => f.write_str("LOCAL"),
            CacheSource::Remote => f.write_str("REMOTE"),
            CacheSource::Other(value) => f.write_str(value),
        }
    }
}

/// Whether the lookup hit or missed. Unknown kinds land in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CacheEventKind {
    Hit,
    Miss,
    Other(String),
}

impl Default for CacheEventKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for CacheEventKind {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "HIT" => Self::Hit,
            "MISS" => Self::Miss,
            _ => Self::Other(value),
        }
    }
}

impl From<CacheEventKind> for String {
    fn from(kind: CacheEventKind) -> Self {
        match kind {
            CacheEventKind::Hit => "HIT".to_string(),
            CacheEventKind::Miss => "MISS".to_string(),
            CacheEventKind::Other(value) => value,
        }
    }
}

impl std::fmt::Display for CacheEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheEventKind::Hit => f.write_str("HIT"),
            CacheEventKind::Miss => f.write_str("MISS"),
            CacheEventKind::Other(value) => f.write_str(value),
        }
    }
}

/// Treat an explicit JSON `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Telemetry record posted by the client. Logged, never stored.
///
/// Every field is optional on the wire: missing or `null` values decode to
/// empty ones, so only structurally invalid JSON is refused.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_id: String,
    /// `LOCAL` or `REMOTE`.
    #[serde(default, deserialize_with = "null_as_default")]
    #[schema(value_type = String, example = "LOCAL")]
    pub source: CacheSource,
    /// `HIT` or `MISS`.
    #[serde(default, deserialize_with = "null_as_default")]
    #[schema(value_type = String, example = "HIT")]
    pub event: CacheEventKind,
    /// Kept as a plain string: events are only logged, never used as a key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,
    /// Time saved or spent, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn enabled() -> Self {
        Self {
            status: "enabled".to_string(),
        }
    }
}

// =============================================================================
// Upload / Query
// =============================================================================

/// Body returned after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UploadResponse {
    /// Descriptive references to the stored artifact. Informational only.
    pub urls: Vec<String>,
}

/// Bulk query body. A missing or `null` list is an empty query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ArtifactQueryRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashes: Vec<String>,
}

/// Error entry of a bulk query result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ArtifactErrorInfo {
    pub message: String,
}

/// Per-hash result of a bulk query.
///
/// `tag` and `taskDurationMs` exist in the protocol but are never populated
/// here, since no metadata is persisted next to the blobs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(untagged)]
pub enum ArtifactInfo {
    #[serde(rename_all = "camelCase")]
    Found {
        size: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_duration_ms: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
    },
    Missing { error: ArtifactErrorInfo },
}

impl ArtifactInfo {
    pub const NOT_FOUND_MESSAGE: &'static str = "Artifact not found";

    pub fn found(size: u64) -> Self {
        Self::Found {
            size,
            task_duration_ms: None,
            tag: None,
        }
    }

    pub fn not_found() -> Self {
        Self::Missing {
            error: ArtifactErrorInfo {
                message: Self::NOT_FOUND_MESSAGE.to_string(),
            },
        }
    }
}

/// Bulk query response: requested hash → result.
pub type ArtifactQueryResponse = BTreeMap<String, ArtifactInfo>;
