//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        MatchedPath, Path, Request, State,
    },
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorBody};
use crate::metrics;
use crate::store::{NewUser, User, UserStore};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store every handler talks to.
    pub store: Arc<dyn UserStore>,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state around a store.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Attach the Prometheus handle served on `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status: "ok".
    #[schema(value_type = String)]
    pub status: &'static str,
    /// Human-readable summary.
    #[schema(value_type = String)]
    pub message: &'static str,
    /// RFC 3339 UTC time of the check.
    pub timestamp: String,
}

/// Health check failure response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthErrorResponse {
    /// Status: "error".
    #[schema(value_type = String)]
    pub status: &'static str,
    /// Human-readable summary.
    #[schema(value_type = String)]
    pub message: &'static str,
    /// Raw store error.
    pub error: String,
}

/// Health check handler - 200 if the store answers, 500 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and store reachable", body = HealthResponse),
        (status = 500, description = "Store unreachable", body = HealthErrorResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "ok",
            message: "service and database connected",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "health check failed");
            metrics::inc_store_errors();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthErrorResponse {
                    status: "error",
                    message: "error connecting to the database",
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// List all users ordered by id.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "All users ordered by id", body = [User]),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.store.list().await?;
    Ok(Json(users))
}

/// Create a user from `{name, email}`.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Missing or malformed fields", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let new_user = body.validate()?;

    let user = state.store.insert(&new_user).await?;
    info!(id = user.id, "user created");
    metrics::inc_users_created();

    Ok((StatusCode::CREATED, Json(user)))
}

/// Fetch one user by id.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 400, description = "Id is not an integer", body = ErrorBody),
        (status = 404, description = "No user with this id", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = id.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

    state
        .store
        .find(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", id)))
}

/// Prometheus exposition, 503 when no recorder is installed.
pub async fn metrics_text(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorBody {
                error: "metrics recorder not installed".to_string(),
            }),
        )
            .into_response(),
    }
}

/// Middleware counting requests and timing handlers per matched route.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let timer = metrics::timer_http(endpoint.clone());
    let response = next.run(req).await;
    drop(timer);

    metrics::inc_http_requests(&endpoint, response.status().as_u16());
    response
}
