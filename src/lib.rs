//! Minimal JSON HTTP service over a PostgreSQL `users` table.
//!
//! Four operations map one-to-one onto single SQL statements:
//!
//! ```text
//! GET  /health          SELECT NOW()
//! GET  /api/users       SELECT id, name, email FROM users ORDER BY id
//! POST /api/users       INSERT INTO users (name, email) ... RETURNING id, name, email
//! GET  /api/users/:id   SELECT id, name, email FROM users WHERE id = $1
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`store`]: User records and the data-access seam
//! - [`api`]: HTTP handlers, router, and OpenAPI document
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{ApiError, Result, ServiceError, StoreError};
