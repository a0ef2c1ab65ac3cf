use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::domain::entities::UserId;

/// Field holding a user's balance
pub const BALANCE_FIELD: &str = "balance";

/// Per-user integer counters.
///
/// Increments must be a single atomic upsert in the backing store; callers
/// never read, modify and write back.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Add `delta` to `field`, creating the document when missing.
    /// Returns the value after the increment.
    async fn upsert_increment(&self, user_id: UserId, field: &str, delta: i64) -> Result<i64, StorageError>;

    /// Current value of `field`, 0 when the user has no document
    async fn read_field(&self, user_id: UserId, field: &str) -> Result<i64, StorageError>;
}
