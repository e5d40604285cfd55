//! Integration tests for garrison-redis

use garrison_redis::{RedisConfig, RedisError, RedisService};
use std::time::Duration;

#[test]
fn config_builder_round_trip() {
    let config = RedisConfig::builder()
        .url("redis://cache.internal:6379")
        .database(2)
        .pool_size(16)
        .min_idle(2)
        .connection_timeout(Duration::from_secs(3))
        .build();

    assert_eq!(config.url, "redis://cache.internal:6379");
    assert_eq!(config.database, Some(2));
    assert_eq!(config.pool_size, 16);
    assert_eq!(config.connection_url(), "redis://cache.internal:6379/2");
}

#[test]
fn config_serde_round_trip() {
    let config = RedisConfig::builder()
        .url("redis://localhost:6379")
        .password("hunter2")
        .build();

    let json = serde_json::to_string(&config).unwrap();
    let parsed: RedisConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.url, config.url);
    assert_eq!(parsed.password, config.password);
    assert_eq!(parsed.connection_timeout, config.connection_timeout);
}

#[test]
fn error_classes() {
    assert!(RedisError::Pool("checkout timed out".into()).is_retryable());
    assert!(!RedisError::Serialization("bad json".into()).is_retryable());
    assert!(RedisError::Connection("reset by peer".into()).is_connection_error());
}

// The tests below require a Redis at localhost:6379:
// cargo test -- --ignored

async fn live_service() -> RedisService {
    let config = RedisConfig::builder().url("redis://localhost:6379").build();
    RedisService::new(config).await.unwrap()
}

#[tokio::test]
#[ignore]
async fn health_check_pings_server() {
    let redis = live_service().await;
    redis.health_check().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn store_protocol_round_trip() {
    let redis = live_service().await;

    redis.set_value("it_store_key", "payload").await.unwrap();
    assert!(redis.exists("it_store_key").await.unwrap());

    let value: Option<String> = redis.get_value("it_store_key").await.unwrap();
    assert_eq!(value.as_deref(), Some("payload"));

    let keys = redis.keys("it_store_*").await.unwrap();
    assert!(keys.contains(&"it_store_key".to_string()));

    assert!(redis.delete("it_store_key").await.unwrap());
    assert!(!redis.exists("it_store_key").await.unwrap());
    // Deleting again is a no-op
    assert!(!redis.delete("it_store_key").await.unwrap());
}

#[tokio::test]
#[ignore]
async fn expiry_is_applied_and_reported() {
    let redis = live_service().await;

    redis
        .set_ex("it_ttl_key", "short-lived", Duration::from_secs(1))
        .await
        .unwrap();

    let ttl = redis.ttl("it_ttl_key").await.unwrap();
    assert!(ttl.is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;

    let value: Option<String> = redis.get_value("it_ttl_key").await.unwrap();
    assert_eq!(value, None);
    assert_eq!(redis.ttl("it_ttl_key").await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn counter_primitives_are_atomic_per_command() {
    let redis = live_service().await;
    redis.delete("it_counter").await.unwrap();

    assert_eq!(redis.incr("it_counter", 1).await.unwrap(), 1);
    assert_eq!(redis.incr("it_counter", 9).await.unwrap(), 10);
    assert_eq!(redis.decr("it_counter", 4).await.unwrap(), 6);
    assert_eq!(redis.getset("it_counter", 0).await.unwrap(), Some(6));

    let value: Option<i64> = redis.get_value("it_counter").await.unwrap();
    assert_eq!(value, Some(0));

    redis.delete("it_counter").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn eval_runs_script_atomically() {
    let redis = live_service().await;
    redis.delete("it_eval_key").await.unwrap();

    let script = r#"
        redis.call("set", KEYS[1], ARGV[1])
        return redis.call("get", KEYS[1])
    "#;
    let result: String = redis
        .eval(script, &["it_eval_key"], &["scripted"])
        .await
        .unwrap();
    assert_eq!(result, "scripted");

    redis.delete("it_eval_key").await.unwrap();
}
