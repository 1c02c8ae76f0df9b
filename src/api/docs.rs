//! OpenAPI document for the HTTP API.

use utoipa::OpenApi;

use super::handlers::{self, HealthErrorResponse, HealthResponse};
use crate::error::ErrorBody;
use crate::store::{NewUser, User};

/// OpenAPI description served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_users,
        handlers::create_user,
        handlers::get_user
    ),
    components(schemas(User, NewUser, ErrorBody, HealthResponse, HealthErrorResponse)),
    tags(
        (name = "health", description = "Liveness and store reachability"),
        (name = "users", description = "Create and read users")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| *p == "/health"));
        assert!(paths.iter().any(|p| *p == "/api/users"));
        assert!(paths.iter().any(|p| *p == "/api/users/{id}"));
    }
}
