// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_bearer_token,
    error::ApiError,
    middleware::log_requests,
    models::{
        ArtifactErrorInfo, ArtifactInfo, ArtifactQueryRequest, CacheEvent, StatusResponse,
        UploadResponse,
    },
    state::AppState,
};

pub mod artifacts;
pub mod events;
pub mod health;
pub mod status;

/// Route table.
///
/// The bearer gate wraps the merged router rather than the cache routes
/// alone. It runs for every path under `/v8/artifacts`, including wrong
/// methods and unknown subpaths, so an unauthenticated request gets 401
/// before any 404 or 405. `/health` and the docs stay public.
pub fn router(state: AppState) -> Router {
    let cache_routes = Router::new()
        .route("/v8/artifacts", post(artifacts::query_artifacts))
        .route("/v8/artifacts/events", post(events::record_events))
        .route("/v8/artifacts/status", get(status::get_status))
        .route(
            "/v8/artifacts/{hash}",
            get(artifacts::download_artifact)
                .put(artifacts::upload_artifact)
                .head(artifacts::check_artifact),
        )
        .method_not_allowed_fallback(|| async { ApiError::method_not_allowed() });

    let public_routes = Router::new().route("/health", get(health::health));

    Router::new()
        .merge(cache_routes)
        .merge(public_routes)
        .fallback(|| async { ApiError::not_found("Not found") })
        .layer(from_fn_with_state(state.clone(), require_bearer_token))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
}

/// Full application: routes plus request id, access log and timeout layers.
pub fn app(state: AppState) -> Router {
    let timeout = state.config.request_timeout;

    router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(from_fn(log_requests))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ))
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

/// Adds the bearer token security scheme referenced by the cache routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Shared team token. Set via TURBO_AUTH_TOKEN."))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Turborepo Remote Cache",
        description = "Self-hosted implementation of the Turborepo `/v8/artifacts` API."
    ),
    paths(
        artifacts::download_artifact,
        artifacts::upload_artifact,
        artifacts::check_artifact,
        artifacts::query_artifacts,
        events::record_events,
        status::get_status,
        health::health
    ),
    components(
        schemas(
            ArtifactInfo,
            ArtifactErrorInfo,
            ArtifactQueryRequest,
            UploadResponse,
            CacheEvent,
            StatusResponse,
            health::HealthResponse,
            health::HealthChecks
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Artifacts", description = "Artifact upload, download and lookup"),
        (name = "Events", description = "Client cache telemetry"),
        (name = "Status", description = "Remote caching status"),
        (name = "Health", description = "Liveness probe")
    )
)]
pub struct ApiDoc;
