//! The two fixed atomic procedures behind the lock protocol.
//!
//! Each runs as a single Lua evaluation, so no other client can observe
//! an intermediate state. A client-side check-then-set would race; these
//! are the only write paths the lock layer uses.

use garrison_redis::{RedisService, Result};

/// Claim the lock key for an owner token with a TTL, only if the key is
/// currently absent. Returns 1 on success, 0 when the lock is held.
///
/// EXPIRE with a zero argument removes the key immediately, so a
/// zero-second TTL degrades to a lock that only the in-flight holder
/// observes.
const ACQUIRE_SCRIPT: &str = r#"
    if redis.call("setnx", KEYS[1], ARGV[1]) == 1 then
        redis.call("expire", KEYS[1], ARGV[2])
        return 1
    else
        return 0
    end
"#;

/// Delete the lock key only while it still stores the owner token.
/// Returns 1 when the key was deleted, 0 otherwise (absent, or held by
/// a different owner).
const RELEASE_SCRIPT: &str = r#"
    if redis.call("get", KEYS[1]) == ARGV[1] then
        return redis.call("del", KEYS[1])
    else
        return 0
    end
"#;

/// Atomically set `key` to `token` with `ttl_secs` expiry if absent.
pub(crate) async fn acquire(
    store: &RedisService,
    key: &str,
    token: &str,
    ttl_secs: u64,
) -> Result<bool> {
    let ttl = ttl_secs.to_string();
    let result: i64 = store.eval(ACQUIRE_SCRIPT, &[key], &[token, &ttl]).await?;
    Ok(result == 1)
}

/// Atomically delete `key` if it still holds `token`.
pub(crate) async fn release(store: &RedisService, key: &str, token: &str) -> Result<bool> {
    let result: i64 = store.eval(RELEASE_SCRIPT, &[key], &[token]).await?;
    Ok(result == 1)
}
