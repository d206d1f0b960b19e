//! # Report storage
//!
//! One logical key-value namespace holding every report under `report:<id>`.
//!
//! ## Requirements
//!
//! - Values are either whole HTML documents (max 500 KB) or JSON-encoded
//!   report records (max 300 KB)
//! - Every write refreshes a 1 year expiry, there is no delete path
//! - Reads and writes are single-key, no transactions: concurrent uploads to
//!   the same id are last-write-wins
//!
//! ## Implementation
//!
//! - Redis string per report, `SET key value EX ttl`
//! - `MemoryStore` backs tests and runs without a `REDIS_URL`
use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use crate::error::AppError;

/// Records expire one year after their last write.
pub const REPORT_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

pub fn report_key(id: &str) -> String {
    format!("report:{id}")
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Overwrites any prior value and refreshes the expiry.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), AppError>;
}

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Some(Duration::from_millis(100)));

    let client = Client::open(redis_url).unwrap();
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .unwrap();

    connection_manager
}

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Self {
        Self {
            connection: init_redis(redis_url).await,
        }
    }
}

#[async_trait]
impl ReportStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut connection = self.connection.clone();

        Ok(connection.get(key).await?)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), AppError> {
        let mut connection = self.connection.clone();

        connection
            .set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await?;

        Ok(())
    }
}

/// Process-local store used by tests and by deployments without a Redis.
/// Expiry is enforced lazily on read, which callers cannot tell apart from
/// Redis-side expiry.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();

        if let Some((value, expires_at)) = entries.get(key) {
            if *expires_at > now {
                return Ok(Some(value.clone()));
            }
            entries.remove(key);
        }

        Ok(None)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), AppError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, expires_at));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{MemoryStore, ReportStore, report_key};

    #[test]
    fn test_report_key() {
        assert_eq!(report_key("ab12cd34"), "report:ab12cd34");
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();

        store
            .put("report:x", "value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("report:x").await.unwrap().as_deref(), Some("value"));
        assert_eq!(store.get("report:y").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemoryStore::new();

        store
            .put("report:x", "value".to_string(), Duration::from_secs(0))
            .await
            .unwrap();

        assert_eq!(store.get("report:x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_overwrite() {
        let store = MemoryStore::new();

        store
            .put("report:x", "old".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        store
            .put("report:x", "new".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("report:x").await.unwrap().as_deref(), Some("new"));
    }
}
