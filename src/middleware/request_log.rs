// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request access log.
//!
//! Emits exactly one event per request with method, path, final status,
//! latency and request id. It sits outside the auth gate and the timeout, so
//! 401 and 408 responses are logged like any other. The status is taken from
//! the finished response: handler results, extractor rejections and the
//! router's 405 fallback all end up there.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// Header set by `SetRequestIdLayer` before this middleware runs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    if response.status().is_server_error() {
        tracing::error!(%method, %path, status, latency_ms, %request_id, "Request failed");
    } else {
        tracing::info!(%method, %path, status, latency_ms, %request_id, "Request handled");
    }

    response
}
