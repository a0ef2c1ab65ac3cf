//! In-memory balance store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::UserId;
use crate::domain::traits::BalanceStore;

/// Counters kept in process memory; lost on restart
#[derive(Default, Clone)]
pub struct MemoryStore {
    fields: Arc<RwLock<HashMap<(UserId, String), i64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    async fn upsert_increment(&self, user_id: UserId, field: &str, delta: i64) -> Result<i64, StorageError> {
        // single write-lock critical section
        let mut fields = self.fields.write().await;
        let key = (user_id, field.to_string());
        let current = fields.get(&key).copied().unwrap_or(0);
        let Some(next) = current.checked_add(delta) else {
            tracing::error!("Refused to modify user {}'s {} ({:+}): out of range", user_id, field, delta);
            return Err(StorageError::Overflow {
                field: field.to_string(),
                delta,
            });
        };
        fields.insert(key, next);
        tracing::info!("Modified user {}'s {} ({:+}).", user_id, field, delta);
        Ok(next)
    }

    async fn read_field(&self, user_id: UserId, field: &str) -> Result<i64, StorageError> {
        let fields = self.fields.read().await;
        Ok(fields.get(&(user_id, field.to_string())).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::BALANCE_FIELD;

    #[tokio::test]
    async fn test_absent_reads_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.read_field(1, BALANCE_FIELD).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = MemoryStore::new();
        store.upsert_increment(7, BALANCE_FIELD, 10).await.unwrap();

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert_increment(7, BALANCE_FIELD, 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.read_field(7, BALANCE_FIELD).await.unwrap(), 110);
        assert_eq!(store.read_field(8, BALANCE_FIELD).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overflow_leaves_value_untouched() {
        let store = MemoryStore::new();
        store.upsert_increment(1, BALANCE_FIELD, i64::MAX).await.unwrap();

        let err = store.upsert_increment(1, BALANCE_FIELD, 1).await.unwrap_err();
        assert!(matches!(err, StorageError::Overflow { delta: 1, .. }));
        assert_eq!(store.read_field(1, BALANCE_FIELD).await.unwrap(), i64::MAX);

        assert!(store.upsert_increment(2, BALANCE_FIELD, i64::MIN).await.is_ok());
        assert!(store.upsert_increment(2, BALANCE_FIELD, -1).await.is_err());
        assert_eq!(store.read_field(2, BALANCE_FIELD).await.unwrap(), i64::MIN);
    }
}
