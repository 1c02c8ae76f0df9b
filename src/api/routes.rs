//! HTTP API route definitions.

use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::docs::ApiDoc;
use super::handlers::{
    create_user, get_user, health, list_users, metrics_text, track_metrics, AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(health))
        // Users
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:id", get(get_user))
        // Metrics endpoint
        .route("/metrics", get(metrics_text))
        .route_layer(middleware::from_fn(track_metrics))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
