#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{AuthUser, OtpChallenge, OutboxEvent, PendingOutboxEvent};
use crate::error::AuthServiceError;

/// Repository for user accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError>;

    /// Return the user with this email, creating one on first sign-in.
    async fn find_or_create_by_email(&self, email: &str) -> Result<AuthUser, AuthServiceError>;
}

/// Repository for one-time passcodes.
pub trait OtpChallengeRepository: Send + Sync {
    /// In one transaction: revoke every active challenge for the email, insert
    /// `challenge`, insert `event`.
    async fn issue_with_outbox(
        &self,
        challenge: &OtpChallenge,
        event: &OutboxEvent,
    ) -> Result<(), AuthServiceError>;

    /// Newest active challenge for the email.
    async fn find_active(&self, email: &str) -> Result<Option<OtpChallenge>, AuthServiceError>;

    /// Mark consumed if still active. Returns `false` when another redemption,
    /// a newer issue or expiry got there first.
    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError>;
}

/// Repository side of the outbox relay.
pub trait OutboxRepository: Send + Sync {
    /// Unprocessed, unfailed rows whose `next_attempt_at` has passed, oldest first.
    async fn due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<PendingOutboxEvent>, AuthServiceError>;

    async fn mark_processed(&self, id: Uuid) -> Result<(), AuthServiceError>;

    async fn schedule_retry(
        &self,
        id: Uuid,
        attempts: i32,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> Result<(), AuthServiceError>;

    async fn mark_failed(
        &self,
        id: Uuid,
        attempts: i32,
        error: &str,
    ) -> Result<(), AuthServiceError>;
}

/// Per-email throttle on code issuance.
pub trait RateLimiter: Send + Sync {
    /// Count one request. Returns `false` once the window's quota is used up.
    async fn check(&self, email: &str) -> Result<bool, AuthServiceError>;
}

/// Outbound email provider.
pub trait EmailSender: Send + Sync {
    /// Retries of one outbox event reuse `idempotency_key`, so the provider
    /// delivers at most one email per event.
    async fn send_otp(&self, to: &str, code: &str, idempotency_key: &str) -> anyhow::Result<()>;
}
