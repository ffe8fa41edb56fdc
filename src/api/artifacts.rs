// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Artifact download, upload, existence check and bulk query.

use std::collections::BTreeMap;
use std::io;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::Response,
    Json,
};
use futures_util::{stream, StreamExt, TryStreamExt};
use tokio_util::io::{ReaderStream, StreamReader};

use crate::{
    error::ApiError,
    models::{
        ArtifactHash, ArtifactInfo, ArtifactQueryRequest, ArtifactQueryResponse, UploadResponse,
    },
    state::AppState,
    storage::{ArtifactStore, StorageError},
};

/// Upper bound on concurrent lookups within one bulk query.
const QUERY_CONCURRENCY: usize = 32;

/// Log storage failures that are the server's fault, then map to a response.
fn storage_failure(operation: &'static str, hash: &ArtifactHash, err: StorageError) -> ApiError {
    if !matches!(err, StorageError::NotFound(_)) {
        tracing::error!(%hash, operation, error = %err, "Artifact storage failure");
    }
    err.into()
}

#[utoipa::path(
    get,
    path = "/v8/artifacts/{hash}",
    params(("hash" = String, Path, description = "Artifact hash")),
    tag = "Artifacts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Artifact payload", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 400, description = "Invalid hash"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Artifact not found")
    )
)]
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response, ApiError> {
    let hash = ArtifactHash::parse(hash)?;
    let artifact = state
        .store
        .retrieve(&hash)
        .await
        .map_err(|e| storage_failure("download", &hash, e))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(CONTENT_LENGTH, artifact.size)
        .body(Body::from_stream(ReaderStream::new(artifact.reader)))
        .map_err(|e| {
            tracing::error!(%hash, error = %e, "Failed to build download response");
            ApiError::internal("Internal server error")
        })
}

#[utoipa::path(
    put,
    path = "/v8/artifacts/{hash}",
    params(("hash" = String, Path, description = "Artifact hash")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    tag = "Artifacts",
    security(("bearer_auth" = [])),
    responses(
        (status = 202, description = "Artifact stored", body = UploadResponse),
        (status = 400, description = "Invalid hash or missing Content-Length"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Artifact could not be stored")
    )
)]
pub async fn upload_artifact(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let hash = ArtifactHash::parse(hash)?;
    if !headers.contains_key(CONTENT_LENGTH) {
        return Err(ApiError::bad_request("Content-Length required"));
    }

    let mut reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let size = state
        .store
        .store(&hash, &mut reader)
        .await
        .map_err(|e| storage_failure("upload", &hash, e))?;

    tracing::info!(%hash, size, "Artifact uploaded");

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            urls: vec![state.config.artifact_url(&hash)],
        }),
    ))
}

#[utoipa::path(
    head,
    path = "/v8/artifacts/{hash}",
    params(("hash" = String, Path, description = "Artifact hash")),
    tag = "Artifacts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Artifact exists"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Artifact not found")
    )
)]
pub async fn check_artifact(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<StatusCode, ApiError> {
    let hash = ArtifactHash::parse(hash)?;
    match state.store.exists(&hash).await {
        Ok(true) => Ok(StatusCode::OK),
        Ok(false) => Err(ApiError::not_found("Artifact not found")),
        Err(e) => Err(storage_failure("exists", &hash, e)),
    }
}

async fn lookup(store: &dyn ArtifactStore, raw: &str) -> ArtifactInfo {
    let hash = match ArtifactHash::parse(raw) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::debug!(hash = raw, error = %e, "Invalid hash in artifact query");
            return ArtifactInfo::not_found();
        }
    };

    match store.retrieve(&hash).await {
        Ok(artifact) => ArtifactInfo::found(artifact.size),
        Err(StorageError::NotFound(_)) => ArtifactInfo::not_found(),
        Err(e) => {
            tracing::warn!(%hash, error = %e, "Artifact lookup failed during query");
            ArtifactInfo::not_found()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v8/artifacts",
    request_body = ArtifactQueryRequest,
    tag = "Artifacts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Result per requested hash", body = BTreeMap<String, ArtifactInfo>),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn query_artifacts(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ArtifactQueryResponse>, ApiError> {
    let request: ArtifactQueryRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))?;

    let results: ArtifactQueryResponse = stream::iter(request.hashes)
        .map(|raw| {
            let store = state.store.clone();
            async move {
                let info = lookup(&*store, &raw).await;
                (raw, info)
            }
        })
        .buffer_unordered(QUERY_CONCURRENCY)
        .collect()
        .await;

    Ok(Json(results))
}
