use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::repository::{EmailSender, OutboxRepository};
use crate::usecase::outbox::{DispatchOutboxUseCase, DispatchReport};

/// Polls the outbox on a fixed interval until cancelled.
pub struct OutboxRelay<O, M>
where
    O: OutboxRepository,
    M: EmailSender,
{
    pub dispatch: DispatchOutboxUseCase<O, M>,
    pub poll_interval: Duration,
}

impl<O, M> OutboxRelay<O, M>
where
    O: OutboxRepository,
    M: EmailSender,
{
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "outbox relay started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.pass().await,
            }
        }

        info!("outbox relay stopped");
    }

    async fn pass(&self) {
        match self.dispatch.execute(Utc::now()).await {
            Ok(report) if report != DispatchReport::default() => {
                debug!(?report, "outbox pass");
            }
            Ok(_) => {}
            Err(e) => error!(error = ?e, "outbox pass failed"),
        }
    }
}
