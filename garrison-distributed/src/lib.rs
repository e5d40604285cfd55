//! # Garrison Distributed
//!
//! Coordination primitives over a shared Redis store.
//!
//! ## Features
//!
//! - **Distributed Locks** - atomic owner-checked acquire/release with
//!   TTL self-healing
//! - **Bounded Acquisition** - fixed 500 ms polling within a caller wait
//!   budget
//! - **Guarded Execution** - run a closure under a lock, failures
//!   funneled to an error handler
//! - **Atomic Counters** - named sequence counters on native INCR/DECR
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use garrison_distributed::{CounterService, LockService};
//! use garrison_redis::{RedisConfig, RedisService};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisConfig::builder()
//!         .url("redis://localhost:6379")
//!         .build();
//!     let store = Arc::new(RedisService::new(config).await?);
//!
//!     let locks = LockService::new(store.clone());
//!     let counters = CounterService::new(store);
//!
//!     let settled = locks
//!         .with_lock_or_else(
//!             "orders:settle",
//!             Duration::from_secs(10),
//!             || async {
//!                 // critical section
//!                 Ok(42u64)
//!             },
//!             |error| eprintln!("settlement skipped: {error}"),
//!         )
//!         .await;
//!
//!     if settled.is_some() {
//!         counters.increment("orders:settled").await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod counter;
pub mod lock;
mod script;

pub use counter::CounterService;
pub use lock::{LockError, LockGuard, LockService, OperationError};
