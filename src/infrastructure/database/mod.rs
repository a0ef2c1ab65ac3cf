//! SQLite balance store

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::application::errors::StorageError;
use crate::domain::entities::UserId;
use crate::domain::traits::BalanceStore;

/// Balances persisted in a single SQLite table keyed by `(uid, field)`
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS balances (
                uid INTEGER NOT NULL,
                field TEXT NOT NULL,
                value INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (uid, field)
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StorageError::Poisoned)?;
            f(&guard).map_err(StorageError::from)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

// Snowflakes stay below 2^63, so the i64 column holds them unchanged.
fn uid(user_id: UserId) -> i64 {
    user_id as i64
}

#[async_trait]
impl BalanceStore for SqliteStore {
    async fn upsert_increment(&self, user_id: UserId, field: &str, delta: i64) -> Result<i64, StorageError> {
        let field_name = field.to_string();
        let result = self
            .with_conn(move |conn| {
                // the sum is checked here; SQLite would silently turn it into a REAL
                let tx = conn.unchecked_transaction()?;
                let current: Option<i64> = tx
                    .query_row(
                        "SELECT value FROM balances WHERE uid = ?1 AND field = ?2",
                        rusqlite::params![uid(user_id), field_name],
                        |row| row.get(0),
                    )
                    .optional()?;

                let Some(next) = current.unwrap_or(0).checked_add(delta) else {
                    return Ok(None);
                };
                tx.execute(
                    "INSERT INTO balances (uid, field, value) VALUES (?1, ?2, ?3)
                     ON CONFLICT (uid, field) DO UPDATE
                     SET value = excluded.value, updated_at = datetime('now')",
                    rusqlite::params![uid(user_id), field_name, next],
                )?;
                tx.commit()?;
                Ok(Some(next))
            })
            .await
            .and_then(|next| {
                next.ok_or_else(|| StorageError::Overflow {
                    field: field.to_string(),
                    delta,
                })
            });

        match &result {
            Ok(_) => tracing::info!("Modified user {}'s {} ({:+}).", user_id, field, delta),
            Err(e) => tracing::error!("Failed to modify user {}'s {}: {}", user_id, field, e),
        }
        result
    }

    async fn read_field(&self, user_id: UserId, field: &str) -> Result<i64, StorageError> {
        let field_name = field.to_string();
        let value: Option<i64> = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT value FROM balances WHERE uid = ?1 AND field = ?2",
                    rusqlite::params![uid(user_id), field_name],
                    |row| row.get(0),
                )
                .optional()
            })
            .await?;

        let value = value.unwrap_or(0);
        tracing::debug!("Checked user {}'s {} ({}).", user_id, field, value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::BALANCE_FIELD;

    #[tokio::test]
    async fn test_upsert_creates_then_increments() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.read_field(42, BALANCE_FIELD).await.unwrap(), 0);

        assert_eq!(store.upsert_increment(42, BALANCE_FIELD, 5).await.unwrap(), 5);
        assert_eq!(store.upsert_increment(42, BALANCE_FIELD, -2).await.unwrap(), 3);
        assert_eq!(store.read_field(42, BALANCE_FIELD).await.unwrap(), 3);
        assert_eq!(store.read_field(42, "xp").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overflow_is_refused_without_writing() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert_increment(1, BALANCE_FIELD, i64::MAX).await.unwrap();

        let err = store.upsert_increment(1, BALANCE_FIELD, 1).await.unwrap_err();
        assert!(matches!(err, StorageError::Overflow { delta: 1, .. }));
        assert_eq!(store.read_field(1, BALANCE_FIELD).await.unwrap(), i64::MAX);

        store.upsert_increment(2, BALANCE_FIELD, i64::MIN).await.unwrap();
        assert!(store.upsert_increment(2, BALANCE_FIELD, -1).await.is_err());
        assert_eq!(store.read_field(2, BALANCE_FIELD).await.unwrap(), i64::MIN);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = SqliteStore::in_memory().unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert_increment(560509387626643477, BALANCE_FIELD, 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.read_field(560509387626643477, BALANCE_FIELD).await.unwrap(), 50);
    }
}
