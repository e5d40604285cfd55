//! Distributed mutual exclusion over the shared Redis store.
//!
//! A lock is a single key holding a UUID owner token with a TTL. Acquire
//! and release both run as atomic server-side scripts, so two clients can
//! never both believe they hold the same key, and a crashed holder is
//! healed by the TTL expiring.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use garrison_redis::{RedisError, RedisService};

use crate::script;

/// Error type produced by a guarded operation.
pub type OperationError = Box<dyn std::error::Error + Send + Sync>;

/// Distributed lock errors.
#[derive(Debug, Error)]
pub enum LockError {
    /// The wait budget elapsed without the lock becoming free.
    #[error("timed out acquiring lock {key} after {waited:?}")]
    Timeout { key: String, waited: Duration },

    /// The store could not be reached or rejected a command.
    #[error("store error: {0}")]
    Store(#[from] RedisError),

    /// The guarded operation itself failed while the lock was held.
    #[error("guarded operation failed: {0}")]
    Operation(#[source] OperationError),
}

/// A held lock, tied to the owner token that acquired it.
///
/// Release explicitly with [`LockGuard::release`]. If the guard is
/// dropped while still held (early return, panic unwind), a best-effort
/// release is spawned in the background; the TTL remains the backstop if
/// that release never lands.
pub struct LockGuard {
    key: String,
    token: String,
    store: Arc<RedisService>,
    released: bool,
}

impl LockGuard {
    fn new(key: String, token: String, store: Arc<RedisService>) -> Self {
        Self {
            key,
            token,
            store,
            released: false,
        }
    }

    /// The lock key this guard holds.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The owner token this guard was acquired with.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Release the lock, consuming the guard.
    ///
    /// Returns `Ok(true)` when the key was deleted, `Ok(false)` when
    /// there was nothing to release (the TTL expired, or another owner
    /// holds the key now). A no-op release is benign; only a store
    /// failure is an error.
    pub async fn release(mut self) -> Result<bool, LockError> {
        let freed = script::release(&self.store, &self.key, &self.token).await?;
        self.released = true;

        if freed {
            debug!(key = %self.key, "released lock");
        } else {
            warn!(
                key = %self.key,
                "release was a no-op (lock expired or taken by another owner)"
            );
        }

        Ok(freed)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        // Best effort: Drop cannot await, so the owner-checked release
        // runs on a spawned task. The TTL covers the case where it
        // never reaches the store.
        let key = std::mem::take(&mut self.key);
        let token = std::mem::take(&mut self.token);
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            if let Err(error) = script::release(&store, &key, &token).await {
                warn!(key = %key, %error, "background lock release failed");
            }
        });
    }
}

/// Interval between acquisition attempts while a lock is contended.
const RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Lock manager over the shared store.
///
/// Stateless apart from the store handle; cheap to clone and share.
#[derive(Clone)]
pub struct LockService {
    store: Arc<RedisService>,
    retry_interval: Duration,
}

impl LockService {
    /// Create a lock manager over the given store.
    pub fn new(store: Arc<RedisService>) -> Self {
        Self {
            store,
            retry_interval: RETRY_INTERVAL,
        }
    }

    /// Override the fixed retry interval. Intended for tests; production
    /// callers keep the 500 ms default.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Single atomic acquisition attempt with a caller-supplied owner
    /// token. Returns whether the lock was obtained.
    pub async fn acquire_lock(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, LockError> {
        let acquired = script::acquire(&self.store, key, token, ttl.as_secs()).await?;
        Ok(acquired)
    }

    /// Release a lock held under a caller-supplied owner token. Returns
    /// whether a key was actually deleted; `false` is the benign no-op.
    pub async fn release_lock(&self, key: &str, token: &str) -> Result<bool, LockError> {
        let freed = script::release(&self.store, key, token).await?;
        Ok(freed)
    }

    /// Try to take the lock once, without waiting.
    ///
    /// A fresh owner token is generated; `None` means the lock is held
    /// by someone else right now.
    pub async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockGuard>, LockError> {
        let token = Uuid::new_v4().to_string();

        if script::acquire(&self.store, key, &token, ttl.as_secs()).await? {
            info!(key, "acquired lock");
            Ok(Some(LockGuard::new(
                key.to_string(),
                token,
                Arc::clone(&self.store),
            )))
        } else {
            debug!(key, "lock already held");
            Ok(None)
        }
    }

    /// Acquire the lock, retrying every 500 ms until `budget` elapses.
    ///
    /// The lock TTL is the budget rounded down to whole seconds, set
    /// once at the first attempt. Budgets under one second therefore
    /// derive a zero-second TTL, which degrades to a lock only the
    /// in-flight holder observes; pass budgets of at least one second.
    pub async fn acquire(&self, key: &str, budget: Duration) -> Result<LockGuard, LockError> {
        let token = Uuid::new_v4().to_string();
        let ttl_secs = budget_ttl_secs(budget);
        let mut waited = Duration::ZERO;

        loop {
            if script::acquire(&self.store, key, &token, ttl_secs).await? {
                info!(key, waited_ms = waited.as_millis() as u64, "acquired lock");
                return Ok(LockGuard::new(
                    key.to_string(),
                    token,
                    Arc::clone(&self.store),
                ));
            }

            if waited >= budget {
                debug!(key, waited_ms = waited.as_millis() as u64, "lock wait budget exhausted");
                return Err(LockError::Timeout {
                    key: key.to_string(),
                    waited,
                });
            }

            debug!(key, "lock contended, waiting");
            tokio::time::sleep(self.retry_interval).await;
            waited += self.retry_interval;
        }
    }

    /// Run `operation` under the lock, discarding every failure.
    ///
    /// Returns `Some(value)` only when the lock was acquired within
    /// `budget` and the operation succeeded; timeouts, store failures
    /// and operation errors all collapse to `None` silently. Use
    /// [`LockService::with_lock_or_else`] when failures need to be
    /// observed.
    pub async fn with_lock<T, F, Fut>(&self, key: &str, budget: Duration, operation: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        self.with_lock_or_else(key, budget, operation, |_| {}).await
    }

    /// Run `operation` under the lock, funneling failures to `on_error`.
    ///
    /// Acquisition follows [`LockService::acquire`]. Once the lock is
    /// held, release always runs after the operation, whether it
    /// succeeded or not; a release failure is logged but never escalates
    /// over the operation's own outcome.
    ///
    /// `on_error` sees [`LockError::Timeout`] when the budget elapses,
    /// [`LockError::Store`] when the store is unreachable, and
    /// [`LockError::Operation`] when the guarded operation fails. In
    /// every error case the return value is `None`.
    pub async fn with_lock_or_else<T, F, Fut, H>(
        &self,
        key: &str,
        budget: Duration,
        operation: F,
        on_error: H,
    ) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
        H: FnOnce(LockError),
    {
        let guard = match self.acquire(key, budget).await {
            Ok(guard) => guard,
            Err(error) => {
                on_error(error);
                return None;
            }
        };

        let outcome = operation().await;

        // Release before inspecting the outcome so the error path frees
        // the lock just like the success path.
        if let Err(error) = guard.release().await {
            warn!(key, %error, "failed to release lock after guarded operation");
        }

        match outcome {
            Ok(value) => Some(value),
            Err(error) => {
                on_error(LockError::Operation(error));
                None
            }
        }
    }
}

/// Whole seconds of TTL derived from the total wait budget.
fn budget_ttl_secs(budget: Duration) -> u64 {
    budget.as_millis() as u64 / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_whole_seconds_of_budget() {
        assert_eq!(budget_ttl_secs(Duration::from_millis(500)), 0);
        assert_eq!(budget_ttl_secs(Duration::from_millis(999)), 0);
        assert_eq!(budget_ttl_secs(Duration::from_millis(1000)), 1);
        assert_eq!(budget_ttl_secs(Duration::from_millis(1999)), 1);
        assert_eq!(budget_ttl_secs(Duration::from_secs(30)), 30);
    }

    #[test]
    fn timeout_display_names_key_and_wait() {
        let err = LockError::Timeout {
            key: "orders:settle".into(),
            waited: Duration::from_millis(1500),
        };
        let text = err.to_string();
        assert!(text.contains("orders:settle"));
        assert!(text.contains("1.5s"));
    }

    #[test]
    fn operation_error_wraps_source() {
        let source: OperationError = "disk full".into();
        let err = LockError::Operation(source);
        assert!(err.to_string().contains("disk full"));
    }
}
