// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{body::Bytes, http::StatusCode};

use crate::{error::ApiError, models::CacheEvent};

/// Record client cache telemetry.
///
/// Events are written to the log and dropped; nothing is persisted.
#[utoipa::path(
    post,
    path = "/v8/artifacts/events",
    request_body = [CacheEvent],
    tag = "Events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Events recorded"),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn record_events(body: Bytes) -> Result<StatusCode, ApiError> {
    let events: Vec<CacheEvent> = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))?;

    for event in &events {
        tracing::info!(
            session_id = %event.session_id,
            source = %event.source,
            event = %event.event,
            hash = %event.hash,
            duration = event.duration.unwrap_or_default(),
            "Cache event"
        );
    }

    Ok(StatusCode::OK)
}
