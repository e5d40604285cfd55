//! Named atomic sequence counters over the shared Redis store.
//!
//! Each counter is an integer key mutated only through the server's
//! native atomic commands, so concurrent updates from any number of
//! processes never lose increments. An absent key reads as zero.

use std::sync::Arc;

use garrison_redis::{RedisService, Result};

/// Atomic counter operations on named 64-bit sequence keys.
///
/// Stateless apart from the store handle; cheap to clone and share.
#[derive(Clone)]
pub struct CounterService {
    store: Arc<RedisService>,
}

impl CounterService {
    /// Create a counter service over the given store.
    pub fn new(store: Arc<RedisService>) -> Self {
        Self { store }
    }

    /// Add one to the counter, returning the new value.
    pub async fn increment(&self, key: &str) -> Result<i64> {
        self.store.incr(key, 1).await
    }

    /// Subtract one from the counter, returning the new value.
    pub async fn decrement(&self, key: &str) -> Result<i64> {
        self.store.decr(key, 1).await
    }

    /// Add `delta` (which may be negative) to the counter, returning
    /// the new value.
    pub async fn add_and_get(&self, key: &str, delta: i64) -> Result<i64> {
        self.store.incr(key, delta).await
    }

    /// Replace the counter with `value`, returning the previous value.
    /// An absent counter reads as zero.
    pub async fn get_and_set(&self, key: &str, value: i64) -> Result<i64> {
        let previous = self.store.getset(key, value).await?;
        Ok(previous.unwrap_or(0))
    }

    /// Read the counter without modifying it. An absent counter reads
    /// as zero.
    pub async fn get(&self, key: &str) -> Result<i64> {
        let value: Option<i64> = self.store.get_value(key).await?;
        Ok(value.unwrap_or(0))
    }

    /// Set the counter to a starting value.
    ///
    /// A plain write, not an atomic read-modify-write: concurrent
    /// initializers are last-writer-wins. Administrative use only.
    pub async fn initialize(&self, key: &str, value: i64) -> Result<()> {
        self.store.set_value(key, value).await
    }

    /// Set the counter back to zero. Same last-writer-wins caveat as
    /// [`CounterService::initialize`].
    pub async fn reset(&self, key: &str) -> Result<()> {
        self.store.set_value(key, 0i64).await
    }
}
