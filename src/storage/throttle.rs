//! Fixed-window login throttling.
//!
//! Redis key pattern:
//! - `ratelimit:login:{client}` - attempt counter, expires with the window

use super::StoreError;
use async_trait::async_trait;
use redis::AsyncCommands;

/// Counts attempts per key and reports whether the caller is still under the limit.
#[async_trait]
pub trait AttemptLimiter: Send + Sync {
    async fn allow(&self, key: &str, max: u32, window_secs: u64) -> Result<bool, StoreError>;
}

/// Check rate limit using Redis INCR with TTL.
///
/// # Returns
/// * `Ok(true)` if under limit
/// * `Ok(false)` if limit exceeded
pub async fn check_rate_limit<C>(
    con: &mut C,
    key: &str,
    max: u32,
    window_secs: u64,
) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let count: u32 = con.incr(key, 1).await?;

    // First hit opens the window
    if count == 1 {
        con.expire::<_, ()>(key, window_secs as i64).await?;
    }

    Ok(count <= max)
}

#[derive(Clone)]
pub struct RedisAttemptLimiter {
    client: redis::Client,
}

impl RedisAttemptLimiter {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttemptLimiter for RedisAttemptLimiter {
    async fn allow(&self, key: &str, max: u32, window_secs: u64) -> Result<bool, StoreError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Redis connection error: {}", e)))?;

        Ok(check_rate_limit(&mut con, key, max, window_secs).await?)
    }
}
