//! HTTP API module for health, user, and metrics endpoints.

pub mod docs;
pub mod handlers;
pub mod routes;

pub use docs::ApiDoc;
pub use handlers::AppState;
pub use routes::create_router;
