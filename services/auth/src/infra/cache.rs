use std::num::NonZeroU64;

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::{self, Pipeline};

use crate::domain::repository::RateLimiter;
use crate::error::AuthServiceError;

/// Fixed-window counter per email. The window starts on the first hit.
#[derive(Clone)]
pub struct RedisRateLimiter {
    pub pool: Pool,
    pub window_secs: NonZeroU64,
    pub max: u64,
}

fn otp_rate_key(email: &str) -> String {
    format!("otp_rate:{email}")
}

/// `SET key 0 EX window NX` then `INCR key` in one MULTI/EXEC, so the counter
/// never exists without a TTL.
fn rate_window_pipeline(key: &str, window_secs: NonZeroU64) -> anyhow::Result<Pipeline> {
    let window = i64::try_from(window_secs.get()).context("otp rate window out of range")?;
    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SET")
        .arg(key)
        .arg(0)
        .arg("EX")
        .arg(window)
        .arg("NX")
        .ignore()
        .incr(key, 1);
    Ok(pipe)
}

impl RateLimiter for RedisRateLimiter {
    async fn check(&self, email: &str) -> Result<bool, AuthServiceError> {
        let mut conn = self.pool.get().await.context("get redis connection")?;
        let key = otp_rate_key(email);
        let (count,): (u64,) = rate_window_pipeline(&key, self.window_secs)?
            .query_async(&mut conn)
            .await
            .context("increment otp rate")?;
        if count > self.max {
            tracing::debug!(%email, count, "otp rate limit hit");
        }
        Ok(count <= self.max)
    }
}
