//! Short-lived key-value storage for OAuth state and credentials.
//!
//! Two backends implement [`KeyValueStore`]: Redis for deployments and an
//! in-process map for development and tests.
pub mod memory;
pub mod redis;

use crate::error::AppResult;
use async_trait::async_trait;
use std::time::Duration;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Atomically read and remove `key`. At most one caller observes a given value.
    async fn take(&self, key: &str) -> AppResult<Option<String>>;

    /// Backend name and reachability, for health checks
    async fn ping(&self) -> AppResult<&'static str>;
}

pub fn state_key(org_id: &str, user_id: &str) -> String {
    format!("oauth_state:{}:{}", org_id, user_id)
}

pub fn credentials_key(org_id: &str, user_id: &str) -> String {
    format!("oauth_credentials:{}:{}", org_id, user_id)
}
