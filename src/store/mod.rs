//! Data access for the `users` table.
//!
//! This module handles:
//! - User record types and create-request validation
//! - The [`UserStore`] seam handlers depend on
//! - The PostgreSQL implementation
//! - An in-memory mock for testing

pub mod mock;
pub mod postgres;
pub mod types;

use async_trait::async_trait;

use crate::error::StoreError;

pub use mock::MockUserStore;
pub use postgres::PgUserStore;
pub use types::{NewUser, User, ValidNewUser};

/// Single-statement operations against the users table.
///
/// Each call is independent and autocommitted.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Issue a trivial query to prove the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// All users ordered by ascending id.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Insert a user, letting the store assign the id.
    async fn insert(&self, user: &ValidNewUser) -> Result<User, StoreError>;

    /// Look up a user by id.
    async fn find(&self, id: i32) -> Result<Option<User>, StoreError>;
}
