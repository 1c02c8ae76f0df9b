//! In-memory user store for unit testing.
//!
//! Behaves like the PostgreSQL store without a database: ids are assigned
//! from a counter and listings come back in id order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::StoreError;

use super::types::{User, ValidNewUser};
use super::UserStore;

#[derive(Debug, Default)]
struct MockTable {
    rows: Vec<User>,
    last_id: i32,
}

/// Mock user store for testing.
#[derive(Debug, Clone, Default)]
pub struct MockUserStore {
    table: Arc<Mutex<MockTable>>,
    unreachable: Arc<AtomicBool>,
}

impl MockUserStore {
    /// Create an empty, reachable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the store were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.table.lock().unwrap().rows.len()
    }

    /// Whether no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "connect ECONNREFUSED: mock store is unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.check_reachable()?;
        let table = self.table.lock().unwrap();
        let mut rows = table.rows.clone();
        rows.sort_by_key(|u| u.id);
        Ok(rows)
    }

    async fn insert(&self, user: &ValidNewUser) -> Result<User, StoreError> {
        self.check_reachable()?;
        let mut table = self.table.lock().unwrap();
        table.last_id += 1;
        let created = User {
            id: table.last_id,
            name: user.name().to_string(),
            email: user.email().to_string(),
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn find(&self, id: i32) -> Result<Option<User>, StoreError> {
        self.check_reachable()?;
        let table = self.table.lock().unwrap();
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewUser;

    fn valid(name: &str, email: &str) -> ValidNewUser {
        NewUser {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn assigns_increasing_ids() {
        let store = MockUserStore::new();
        let a = store.insert(&valid("Ana", "ana@example.com")).await.unwrap();
        let b = store.insert(&valid("Bo", "bo@example.com")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn find_returns_none_for_unknown_id() {
        let store = MockUserStore::new();
        store.insert(&valid("Ana", "ana@example.com")).await.unwrap();

        assert!(store.find(42).await.unwrap().is_none());
        assert_eq!(store.find(1).await.unwrap().unwrap().name, "Ana");
    }

    #[tokio::test]
    async fn unreachable_store_fails_every_call() {
        let store = MockUserStore::new();
        store.set_unreachable(true);

        assert!(store.ping().await.is_err());
        assert!(store.list().await.is_err());
        assert!(store.find(1).await.is_err());
        assert!(store.insert(&valid("Ana", "ana@example.com")).await.is_err());
        assert!(store.is_empty());

        store.set_unreachable(false);
        assert!(store.ping().await.is_ok());
    }
}
