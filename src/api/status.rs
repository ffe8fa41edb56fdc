// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::models::StatusResponse;

/// Remote caching is always enabled on this server.
#[utoipa::path(
    get,
    path = "/v8/artifacts/status",
    tag = "Status",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = StatusResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse::enabled())
}
