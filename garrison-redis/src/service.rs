//! Pooled Redis store client.

use redis::AsyncCommands;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

use crate::{
    RedisConfig, RedisError, Result,
    pool::{RedisConnection, RedisPool, RedisPoolBuilder},
};

/// Pooled client for the shared Redis store.
///
/// One instance is created at startup and shared (`Arc`) across every
/// call site; it owns no state besides the pool, so it is safe to use
/// from any number of tasks concurrently.
///
/// Every command runs under the configured `command_timeout`; an
/// overrun surfaces as [`RedisError::Timeout`].
pub struct RedisService {
    config: RedisConfig,
    pool: RedisPool,
}

impl RedisService {
    /// Connect and build the pool from the given configuration.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let pool = RedisPoolBuilder::new(config.clone()).build().await?;
        Ok(Self { config, pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(config: RedisConfig, pool: RedisPool) -> Self {
        Self { config, pool }
    }

    /// The configuration this service was built from.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }

    /// Check out a connection from the pool.
    pub async fn get(&self) -> Result<RedisConnection<'_>> {
        let conn = self.pool.get().await?;
        Ok(RedisConnection::new(conn))
    }

    /// Run a store operation under the configured command timeout.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.command_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(RedisError::Timeout),
        }
    }

    /// Round-trip a PING to verify the server is reachable.
    pub async fn health_check(&self) -> Result<()> {
        self.run(async {
            let mut conn = self.get().await?;
            let _: String = redis::cmd("PING")
                .query_async(&mut *conn)
                .await
                .map_err(|e| RedisError::Connection(e.to_string()))?;
            Ok(())
        })
        .await
    }

    /// Get a value.
    pub async fn get_value<T: redis::FromRedisValue>(&self, key: &str) -> Result<Option<T>> {
        self.run(async {
            let mut conn = self.get().await?;
            let value: Option<T> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    /// Set a value.
    pub async fn set_value<T: redis::ToRedisArgs + redis::ToSingleRedisArg + Send + Sync>(
        &self,
        key: &str,
        value: T,
    ) -> Result<()> {
        self.run(async {
            let mut conn = self.get().await?;
            let _: () = conn.set(key, value).await?;
            Ok(())
        })
        .await
    }

    /// Set a value with an expiry.
    pub async fn set_ex<T: redis::ToRedisArgs + redis::ToSingleRedisArg + Send + Sync>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        self.run(async {
            let mut conn = self.get().await?;
            let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
            Ok(())
        })
        .await
    }

    /// Get a value stored as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self.get_value(key).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Store a value as JSON.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_value(key, raw).await
    }

    /// Store a value as JSON with an expiry.
    pub async fn set_json_ex<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_ex(key, raw, ttl).await
    }

    /// Delete a key. Returns whether a key was removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.run(async {
            let mut conn = self.get().await?;
            let deleted: u32 = conn.del(key).await?;
            Ok(deleted > 0)
        })
        .await
    }

    /// Check whether a key exists.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        self.run(async {
            let mut conn = self.get().await?;
            let exists: bool = conn.exists(key).await?;
            Ok(exists)
        })
        .await
    }

    /// List keys matching a glob pattern.
    ///
    /// KEYS walks the whole keyspace; reserve this for administrative
    /// paths, not hot ones.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.run(async {
            let mut conn = self.get().await?;
            let keys: Vec<String> = conn.keys(pattern).await?;
            Ok(keys)
        })
        .await
    }

    /// Set an expiry on an existing key. Returns false if the key is absent.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.run(async {
            let mut conn = self.get().await?;
            let set: bool = conn.expire(key, ttl.as_secs() as i64).await?;
            Ok(set)
        })
        .await
    }

    /// Remaining time-to-live of a key, or `None` when the key is absent
    /// or has no expiry.
    pub async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.run(async {
            let mut conn = self.get().await?;
            let ttl: i64 = conn.ttl(key).await?;
            if ttl < 0 {
                Ok(None)
            } else {
                Ok(Some(Duration::from_secs(ttl as u64)))
            }
        })
        .await
    }

    /// Atomically add `delta` to an integer key, returning the new value.
    ///
    /// A missing key counts from zero. Atomicity is the server's INCRBY
    /// guarantee; no client-side read-modify-write is involved.
    pub async fn incr(&self, key: &str, delta: i64) -> Result<i64> {
        self.run(async {
            let mut conn = self.get().await?;
            let value: i64 = conn.incr(key, delta).await?;
            Ok(value)
        })
        .await
    }

    /// Atomically subtract `delta` from an integer key, returning the new value.
    pub async fn decr(&self, key: &str, delta: i64) -> Result<i64> {
        self.run(async {
            let mut conn = self.get().await?;
            let value: i64 = conn.decr(key, delta).await?;
            Ok(value)
        })
        .await
    }

    /// Atomically replace an integer key, returning the previous value
    /// (`None` when the key was absent).
    pub async fn getset(&self, key: &str, value: i64) -> Result<Option<i64>> {
        self.run(async {
            let mut conn = self.get().await?;
            let previous: Option<i64> = conn.getset(key, value).await?;
            Ok(previous)
        })
        .await
    }

    /// Execute a Lua script as a single atomic step.
    pub async fn eval<T: redis::FromRedisValue>(
        &self,
        script: &str,
        keys: &[&str],
        args: &[&str],
    ) -> Result<T> {
        self.run(async {
            let mut conn = self.get().await?;
            let script = redis::Script::new(script);
            let result: T = script.key(keys).arg(args).invoke_async(&mut *conn).await?;
            Ok(result)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn set_get_delete_round_trip() {
        let config = RedisConfig::builder().url("redis://localhost:6379").build();
        let redis = RedisService::new(config).await.unwrap();

        redis.set_value("svc_test_key", "svc_test_value").await.unwrap();
        let value: Option<String> = redis.get_value("svc_test_key").await.unwrap();
        assert_eq!(value, Some("svc_test_value".to_string()));

        assert!(redis.delete("svc_test_key").await.unwrap());
        assert!(!redis.exists("svc_test_key").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn json_round_trip() {
        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct Payload {
            id: u32,
            name: String,
        }

        let config = RedisConfig::builder().url("redis://localhost:6379").build();
        let redis = RedisService::new(config).await.unwrap();

        let payload = Payload {
            id: 7,
            name: "garrison".into(),
        };
        redis.set_json("svc_test_json", &payload).await.unwrap();
        let read: Option<Payload> = redis.get_json("svc_test_json").await.unwrap();
        assert_eq!(read, Some(payload));

        redis.delete("svc_test_json").await.unwrap();
    }
}
