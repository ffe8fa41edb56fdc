// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! immutable [`AppConfig`] built from them once at startup. Every component
//! receives the values it needs from `AppConfig`; nothing reads the
//! environment after boot.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TURBO_AUTH_TOKEN` | Shared bearer token clients must present | Required |
//! | `TURBO_CACHE_DIR` | Directory holding cached artifacts | `./turbo-cache` |
//! | `TURBO_LOG_FILE` | Append logs to this file instead of stdout | stdout |
//! | `TURBO_ARTIFACT_URL_BASE` | Base of the reference URL returned on upload | `https://api.vercel.com/v2/now/artifact` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `REQUEST_TIMEOUT_SECS` | Per-request timeout in seconds | `300` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::models::ArtifactHash;
use crate::storage::paths::DEFAULT_CACHE_DIR;

/// Environment variable name for the required bearer token.
pub const AUTH_TOKEN_ENV: &str = "TURBO_AUTH_TOKEN";

/// Environment variable name for the artifact directory path.
pub const CACHE_DIR_ENV: &str = "TURBO_CACHE_DIR";

/// Environment variable name for the optional log file path.
pub const LOG_FILE_ENV: &str = "TURBO_LOG_FILE";

/// Environment variable name for the upload reference URL base.
pub const ARTIFACT_URL_BASE_ENV: &str = "TURBO_ARTIFACT_URL_BASE";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// The URL the hosted Vercel cache reports for uploaded artifacts.
/// Clients only display it.
pub const DEFAULT_ARTIFACT_URL_BASE: &str = "https://api.vercel.com/v2/now/artifact";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected `json` or `pretty`, got `{other}`")),
        }
    }
}

/// Bearer secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken([REDACTED])")
    }
}

/// Process-wide configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub auth_token: SecretToken,
    pub cache_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_format: LogFormat,
    pub artifact_url_base: Url,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Configuration with defaults for everything but the token.
    pub fn new(auth_token: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            auth_token: SecretToken::new(auth_token),
            cache_dir: cache_dir.into(),
            log_file: None,
            log_format: LogFormat::default(),
            artifact_url_base: default_artifact_url_base(),
            bind_addr: SocketAddr::new(IpAddr::from([0, 0, 0, 0]), DEFAULT_PORT),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let auth_token = get(AUTH_TOKEN_ENV).ok_or(ConfigError::Missing(AUTH_TOKEN_ENV))?;
        let cache_dir = get(CACHE_DIR_ENV).unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string());

        let mut config = Self::new(auth_token, cache_dir);
        config.log_file = get(LOG_FILE_ENV).map(PathBuf::from);

        if let Some(format) = get(LOG_FORMAT_ENV) {
            config.log_format = format.parse().map_err(|reason| ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                reason,
            })?;
        }

        if let Some(base) = get(ARTIFACT_URL_BASE_ENV) {
            config.artifact_url_base = parse_url_base(&base)?;
        }

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host.parse().map_err(|e| ConfigError::Invalid {
            name: HOST_ENV,
            reason: format!("{e}"),
        })?;
        let port = match get(PORT_ENV) {
            Some(port) => port.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        config.bind_addr = SocketAddr::new(host, port);

        if let Some(secs) = get(REQUEST_TIMEOUT_ENV) {
            let secs = secs.parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: REQUEST_TIMEOUT_ENV,
                reason: e.to_string(),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: REQUEST_TIMEOUT_ENV,
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Informational URL reported back to the client after an upload.
    pub fn artifact_url(&self, hash: &ArtifactHash) -> String {
        format!(
            "{}/{}",
            self.artifact_url_base.as_str().trim_end_matches('/'),
            hash
        )
    }
}

fn default_artifact_url_base() -> Url {
    Url::parse(DEFAULT_ARTIFACT_URL_BASE).expect("default artifact URL base is valid")
}

fn parse_url_base(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        name: ARTIFACT_URL_BASE_ENV,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            name: ARTIFACT_URL_BASE_ENV,
            reason: format!("`{value}` cannot be used as a base URL"),
        });
    }
    Ok(url)
}
