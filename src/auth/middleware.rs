// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token middleware for Axum.
//!
//! The gate is keyed on the request path, not on the matched route, so it is
//! installed on the outer router with `Router::layer` and also covers paths
//! under [`PROTECTED_PREFIX`] that match no route.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .merge(cache_routes)
//!     .layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         require_bearer_token,
//!     ));
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use super::AuthError;
use crate::config::SecretToken;
use crate::state::AppState;

/// Every path at or below this prefix needs the bearer token.
pub const PROTECTED_PREFIX: &str = "/v8/artifacts";

/// Whether `path` belongs to the cache API.
pub fn is_protected(path: &str) -> bool {
    path.strip_prefix(PROTECTED_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Reject cache API requests unless they carry `Authorization: Bearer <secret>`.
///
/// Paths outside [`PROTECTED_PREFIX`] pass through. On success the request
/// reaches the wrapped service untouched.
pub async fn require_bearer_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_protected(request.uri().path()) {
        return next.run(request).await;
    }

    match authorize(request.headers(), &state.config.auth_token) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::debug!(reason = e.error_code(), "Rejected unauthenticated request");
            e.into_response()
        }
    }
}

/// Check the `Authorization` header against the configured secret.
pub fn authorize(headers: &HeaderMap, expected: &SecretToken) -> Result<(), AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    if constant_time_token_eq(token, expected.expose()) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

/// Byte-for-byte comparison that does not short-circuit on the first
/// mismatching byte.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}
