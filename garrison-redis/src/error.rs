//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, RedisError>;

/// Errors surfaced by the Redis store client.
///
/// Transport and pool failures are the store-unavailable class: callers
/// see them directly and decide whether to retry.
#[derive(Debug, Error)]
pub enum RedisError {
    /// Could not reach the Redis server.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connection pool failure (exhausted or checkout timed out).
    #[error("Pool error: {0}")]
    Pool(String),

    /// A command was rejected by the server.
    #[error("Command error: {0}")]
    Command(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The operation did not complete in time.
    #[error("Operation timed out")]
    Timeout,

    /// Underlying driver error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl RedisError {
    /// Whether retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Pool(_) | Self::Timeout)
    }

    /// Whether this error indicates the connection was lost.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl<E> From<bb8::RunError<E>> for RedisError
where
    E: std::error::Error + 'static,
{
    fn from(err: bb8::RunError<E>) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<serde_json::Error> for RedisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes() {
        assert!(RedisError::Connection("refused".into()).is_retryable());
        assert!(RedisError::Pool("exhausted".into()).is_retryable());
        assert!(RedisError::Timeout.is_retryable());
        assert!(!RedisError::Config("bad url".into()).is_retryable());
    }

    #[test]
    fn display_includes_cause() {
        let err = RedisError::Connection("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }
}
