use std::num::NonZeroU64;

use anyhow::Context as _;
use axum::extract::FromRef;
use deadpool_redis::Pool as RedisPool;
use deadpool_redis::redis::AsyncCommands;
use sea_orm::DatabaseConnection;

use bookly_auth_types::cookie::CookieSettings;
use bookly_auth_types::session::SessionKey;
use bookly_core::health::ReadinessCheck;

use crate::infra::cache::RedisRateLimiter;
use crate::infra::db::{DbOtpChallengeRepository, DbOutboxRepository, DbUserRepository};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub jwt_secret: String,
    pub session_key: SessionKey,
    pub cookies: CookieSettings,
    pub otp_rate_limit_window_secs: NonZeroU64,
    pub otp_rate_limit_max: u64,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp_challenge_repo(&self) -> DbOtpChallengeRepository {
        DbOtpChallengeRepository {
            db: self.db.clone(),
        }
    }

    pub fn outbox_repo(&self) -> DbOutboxRepository {
        DbOutboxRepository {
            db: self.db.clone(),
        }
    }

    pub fn rate_limiter(&self) -> RedisRateLimiter {
        RedisRateLimiter {
            pool: self.redis.clone(),
            window_secs: self.otp_rate_limit_window_secs,
            max: self.otp_rate_limit_max,
        }
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.db.ping().await.context("postgres ping")?;
        let mut conn = self.redis.get().await.context("redis connection")?;
        let _: Option<String> = conn.get("readyz").await.context("redis get")?;
        Ok(())
    }
}

impl FromRef<AppState> for SessionKey {
    fn from_ref(state: &AppState) -> Self {
        state.session_key.clone()
    }
}

impl ReadinessCheck for AppState {
    async fn check_ready(&self) -> Result<(), String> {
        self.ping().await.map_err(|e| format!("{e:#}"))
    }
}
