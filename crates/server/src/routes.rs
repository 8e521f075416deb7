use std::sync::Arc;

use axum::{
    routing::{get, put},
    Json, Router,
};
use configs::DataLayerConfig;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::session::SessionRegistry;

pub mod api;
pub mod pages;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub datalayer: Arc<DataLayerConfig>,
}

impl AppState {
    pub fn new(datalayer: DataLayerConfig) -> Self {
        Self { sessions: SessionRegistry::new(), datalayer: Arc::new(datalayer) }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Build the full application router
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/health", get(health))
        .route(
            "/datalayer",
            get(api::show).post(api::merge).delete(api::clear),
        )
        .route("/datalayer/:key", put(api::set))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
