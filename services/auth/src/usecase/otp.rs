use anyhow::Context as _;
use chrono::{Duration, Utc};
use rand::RngExt;
use uuid::Uuid;

use bookly_domain::email::Email;
use bookly_domain::otp::{OTP_LEN, OTP_TTL_SECS};

use crate::domain::repository::{OtpChallengeRepository, RateLimiter};
use crate::domain::types::{OTP_ISSUED, OtpChallenge, OtpIssuedPayload, OutboxEvent};
use crate::error::AuthServiceError;

/// Random numeric code of [`OTP_LEN`] digits; leading zeros allowed.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..OTP_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

pub struct IssueOtpInput {
    pub email: String,
}

pub struct IssueOtpUseCase<R, C>
where
    R: RateLimiter,
    C: OtpChallengeRepository,
{
    pub limiter: R,
    pub challenges: C,
}

impl<R, C> IssueOtpUseCase<R, C>
where
    R: RateLimiter,
    C: OtpChallengeRepository,
{
    pub async fn execute(&self, input: IssueOtpInput) -> Result<(), AuthServiceError> {
        // 1. Normalise the address → 400 if malformed
        let email = Email::parse(&input.email).map_err(|_| AuthServiceError::InvalidEmail)?;

        // 2. Per-email throttle → 429
        if !self.limiter.check(email.as_str()).await? {
            return Err(AuthServiceError::TooManyRequests);
        }

        // 3. New challenge, superseding any earlier one
        let code = generate_code();
        let now = Utc::now();
        let challenge = OtpChallenge {
            id: Uuid::now_v7(),
            email: email.as_str().to_owned(),
            code: code.clone(),
            expires_at: now + Duration::seconds(OTP_TTL_SECS),
            consumed_at: None,
            revoked_at: None,
            created_at: now,
        };

        // 4. Challenge + email event in one transaction
        let payload = OtpIssuedPayload {
            email: challenge.email.clone(),
            code,
        };
        let event = OutboxEvent {
            id: Uuid::now_v7(),
            kind: OTP_ISSUED.to_owned(),
            payload: serde_json::to_value(&payload).context("serialize otp payload")?,
            idempotency_key: format!("{OTP_ISSUED}:{}", challenge.id),
        };

        self.challenges.issue_with_outbox(&challenge, &event).await?;
        tracing::debug!(challenge_id = %challenge.id, "otp challenge issued");
        Ok(())
    }
}
