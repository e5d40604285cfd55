//! # Garrison Redis
//!
//! Pooled Redis store client for the Garrison coordination layer.
//!
//! ## Features
//!
//! - **Connection Pooling**: bb8-managed connections, verified at startup
//! - **Typed Operations**: get/set/delete/exists/keys/expire with typed values
//! - **JSON Values**: store structs as JSON documents
//! - **Atomic Primitives**: INCR/DECR/GETSET and Lua script execution,
//!   consumed by `garrison-distributed` for locks and sequence counters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use garrison_redis::{RedisConfig, RedisService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisConfig::builder()
//!         .url("redis://localhost:6379")
//!         .pool_size(8)
//!         .build();
//!
//!     let redis = RedisService::new(config).await?;
//!
//!     redis.set_value("greeting", "hello").await?;
//!     let value: Option<String> = redis.get_value("greeting").await?;
//!     assert_eq!(value.as_deref(), Some("hello"));
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod pool;
mod service;

pub use config::{RedisConfig, RedisConfigBuilder};
pub use error::{RedisError, Result};
pub use pool::{RedisConnection, RedisPool, RedisPoolBuilder};
pub use service::RedisService;

// Re-export redis crate for call sites issuing raw commands
pub use redis;
pub use redis::{AsyncCommands, RedisResult, Value};

/// Prelude for common imports.
///
/// ```
/// use garrison_redis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{RedisConfig, RedisConfigBuilder};
    pub use crate::error::{RedisError, Result};
    pub use crate::pool::{RedisConnection, RedisPool};
    pub use crate::service::RedisService;
    pub use redis::AsyncCommands;
}
