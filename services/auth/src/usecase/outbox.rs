use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::domain::repository::{EmailSender, OutboxRepository};
use crate::domain::types::{MAX_OUTBOX_ATTEMPTS, OTP_ISSUED, OtpIssuedPayload, PendingOutboxEvent};
use crate::error::AuthServiceError;

/// Delay before the next attempt once `attempts` deliveries have failed.
pub fn backoff(attempts: i32) -> Duration {
    Duration::seconds(1i64 << attempts.clamp(0, 30))
}

/// What one relay pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

pub struct DispatchOutboxUseCase<O, M>
where
    O: OutboxRepository,
    M: EmailSender,
{
    pub outbox: O,
    pub mailer: M,
    pub batch_size: u64,
}

impl<O, M> DispatchOutboxUseCase<O, M>
where
    O: OutboxRepository,
    M: EmailSender,
{
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<DispatchReport, AuthServiceError> {
        let mut report = DispatchReport::default();
        for event in self.outbox.due(now, self.batch_size).await? {
            self.deliver(event, now, &mut report).await?;
        }
        Ok(report)
    }

    async fn deliver(
        &self,
        event: PendingOutboxEvent,
        now: DateTime<Utc>,
        report: &mut DispatchReport,
    ) -> Result<(), AuthServiceError> {
        if event.kind != OTP_ISSUED {
            warn!(event_id = %event.id, kind = %event.kind, "unknown outbox kind");
            self.outbox
                .mark_failed(event.id, event.attempts, "unknown event kind")
                .await?;
            report.failed += 1;
            return Ok(());
        }

        let payload: OtpIssuedPayload = match serde_json::from_value(event.payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "malformed outbox payload");
                self.outbox
                    .mark_failed(event.id, event.attempts, &e.to_string())
                    .await?;
                report.failed += 1;
                return Ok(());
            }
        };

        match self
            .mailer
            .send_otp(&payload.email, &payload.code, &event.idempotency_key)
            .await
        {
            Ok(()) => {
                self.outbox.mark_processed(event.id).await?;
                info!(event_id = %event.id, "otp email sent");
                report.sent += 1;
            }
            Err(e) => {
                let attempts = event.attempts + 1;
                let error = format!("{e:#}");
                if attempts >= MAX_OUTBOX_ATTEMPTS {
                    warn!(event_id = %event.id, attempts, %error, "giving up on otp email");
                    self.outbox.mark_failed(event.id, attempts, &error).await?;
                    report.failed += 1;
                } else {
                    let next_attempt_at = now + backoff(attempts);
                    warn!(
                        event_id = %event.id,
                        attempts,
                        %error,
                        %next_attempt_at,
                        "otp email failed, retrying"
                    );
                    self.outbox
                        .schedule_retry(event.id, attempts, next_attempt_at, &error)
                        .await?;
                    report.retried += 1;
                }
            }
        }
        Ok(())
    }
}
