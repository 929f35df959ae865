use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookly_domain::destination::Destination;

/// Account row as the auth service sees it.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub onboarded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_onboarded(&self) -> bool {
        self.onboarded_at.is_some()
    }

    pub fn destination(&self) -> Destination {
        Destination::for_user(self.is_onboarded())
    }
}

/// One-time passcode issued to an email address.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// Redeemable at `now`: not consumed, not superseded, not expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Outbox event written in the same transaction as the data it announces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

/// Outbox row due for delivery.
#[derive(Debug, Clone)]
pub struct PendingOutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
    pub attempts: i32,
}

/// Payload of an [`OTP_ISSUED`] event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpIssuedPayload {
    pub email: String,
    pub code: String,
}

/// Outbox kind for "email this code".
pub const OTP_ISSUED: &str = "otp_issued";

/// Deliveries give up after this many failed attempts.
pub const MAX_OUTBOX_ATTEMPTS: i32 = 5;

/// Outbox rows claimed per relay pass.
pub const OUTBOX_BATCH_SIZE: u64 = 20;
