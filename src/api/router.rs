//! API router for the query assistant.
//!
//! Routes are nested under `/api/ai`. The AI routes ship unauthenticated;
//! auth middleware belongs to the portal's outer deployment, not this crate.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the full API router with CORS for the frontend.
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/ai/query", post(endpoints::ai::query))
        .route("/api/ai/query-with-docs", post(endpoints::ai::query_with_docs))
        .route("/api/ai/samples", get(endpoints::ai::samples))
        .route("/api/ai/health", get(endpoints::health::check))
        .with_state(ctx)
        .layer(CorsLayer::permissive())
}
