pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::LibraryConfig;
use crate::services::{EmailProvider, HandoffCodec, LibraryStore, Storage};
use service_core::error::AppError;

/// Deadline carried by every request-scoped operation.
pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Clone)]
pub struct AppState {
    pub config: LibraryConfig,
    pub store: Arc<dyn LibraryStore>,
    pub email: Arc<dyn EmailProvider>,
    pub storage: Arc<dyn Storage>,
    pub handoff: HandoffCodec,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .map(|o| {
                    o.parse::<HeaderValue>().unwrap_or_else(|e| {
                        tracing::error!("Invalid CORS origin '{}': {}. Using fallback.", o, e);
                        HeaderValue::from_static("*")
                    })
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-user-id"),
        ]);

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/callback", post(handlers::auth::sign_in_callback))
        .route("/invite/:token", get(handlers::invite::follow_invite_link))
        .route(
            "/invitations",
            post(handlers::invitations::create_invitation)
                .get(handlers::invitations::list_invitations),
        )
        .route(
            "/media",
            post(handlers::media::register_media).get(handlers::media::list_media),
        )
        .route("/media/deleted", get(handlers::media::list_deleted_media))
        .route("/media/sweep", post(handlers::sweep::run_sweep))
        .route(
            "/media/:id",
            get(handlers::media::get_media)
                .put(handlers::media::update_media)
                .delete(handlers::media::delete_media),
        )
        .route("/media/:id/restore", post(handlers::media::restore_media))
        .route(
            "/collections",
            post(handlers::collections::create_collection)
                .get(handlers::collections::list_collections),
        )
        .route(
            "/collections/:id",
            get(handlers::collections::get_collection)
                .put(handlers::collections::update_collection)
                .delete(handlers::collections::delete_collection),
        )
        .route(
            "/collections/:id/media",
            post(handlers::collections::add_collection_media),
        )
        .route(
            "/collections/:id/media/:media_id",
            delete(handlers::collections::remove_collection_media),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECONDS)))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

/// Service health check
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}
