//! Integration tests for the PostgreSQL store.
//!
//! Most tests require a reachable PostgreSQL configured through the usual
//! DB_* environment variables (or a .env file).
//! Run with: cargo test --test integration -- --ignored
//!
//! The `users` table is created if it does not exist. Tests against a closed
//! port need no database and always run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use users_api::api::{create_router, AppState};
use users_api::config::Config;
use users_api::store::{NewUser, PgUserStore, UserStore, ValidNewUser};

/// Store connected to the configured database, with the table in place.
async fn test_store() -> PgUserStore {
    let config = Config::load().expect("configuration should load");
    let store = PgUserStore::connect_lazy(&config);

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL
        )",
    )
    .execute(store.pool())
    .await
    .expect("users table should be creatable");

    store
}

fn valid(name: &str, email: &str) -> ValidNewUser {
    NewUser {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
    }
    .validate()
    .unwrap()
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_ping() {
    let store = test_store().await;
    assert!(store.ping().await.is_ok());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_insert_then_find() {
    let store = test_store().await;

    let created = store.insert(&valid("Ana", "ana@example.com")).await.unwrap();
    let found = store.find(created.id).await.unwrap().expect("user should exist");

    assert_eq!(found, created);
    assert_eq!(found.name, "Ana");
    assert_eq!(found.email, "ana@example.com");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_ids_increase_and_list_is_ordered() {
    let store = test_store().await;

    let first = store.insert(&valid("Bo", "bo@example.com")).await.unwrap();
    let second = store.insert(&valid("Cy", "cy@example.com")).await.unwrap();
    assert!(second.id > first.id);

    let users = store.list().await.unwrap();
    assert!(users.windows(2).all(|w| w[0].id <= w[1].id));
    assert!(users.iter().any(|u| u.id == second.id));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_find_missing_returns_none() {
    let store = test_store().await;
    assert!(store.find(i32::MAX).await.unwrap().is_none());
}

/// Configuration pointing at a port nothing listens on.
fn closed_port_config() -> Config {
    envy::from_iter(vec![
        ("DB_HOST".to_string(), "127.0.0.1".to_string()),
        ("DB_PORT".to_string(), "1".to_string()),
        ("DB_ACQUIRE_TIMEOUT_SECS".to_string(), "2".to_string()),
    ])
    .expect("configuration should parse")
}

#[tokio::test]
async fn test_unreachable_database_fails_ping() {
    let store = PgUserStore::connect_lazy(&closed_port_config());

    let err = store.ping().await.unwrap_err();
    assert!(!err.to_string().contains("pool timed out"), "got: {}", err);
}

#[tokio::test]
async fn test_health_reports_refused_connection_promptly() {
    let store = PgUserStore::connect_lazy(&closed_port_config());
    let app = create_router(AppState::new(Arc::new(store)));

    let start = Instant::now();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(elapsed < Duration::from_secs(10), "took {:?}", elapsed);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "error");

    let error = body["error"].as_str().unwrap();
    assert!(!error.is_empty());
    assert!(!error.contains("pool timed out"), "got: {}", error);
}
