//! Async driver for [`Challenge`].
//!
//! The challenge lives behind a mutex held only for one synchronous
//! transition, never across a collaborator call. Overlapping actions see the
//! phase left by whichever took the lock first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use bookly_domain::destination::Destination;
use bookly_domain::email::Email;
use bookly_domain::otp::OtpCode;

use crate::challenge::{Challenge, ChallengeUiState, Command, Phase};
use crate::error::OtpError;
use crate::ports::{
    CredentialStore, Navigator, Notice, Notifier, SessionEstablisher, TracingNotifier,
};

const TICK: Duration = Duration::from_secs(1);

/// What an action led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A guard rejected the action; no request was made.
    Ignored,
    /// Digits accepted, entry not yet complete.
    Pending,
    /// A code (or replacement code) was issued.
    CodeSent,
    /// Redeemed, session established and navigation requested.
    Verified(Destination),
    /// The flow was torn down while the request was in flight; its result was dropped.
    Cancelled,
}

pub struct OtpFlow<S, E, N, T = TracingNotifier> {
    challenge: Arc<Mutex<Challenge>>,
    store: S,
    sessions: E,
    navigator: N,
    notifier: T,
    cancel: CancellationToken,
    ticker: Mutex<Option<CancellationToken>>,
}

impl<S, E, N, T> OtpFlow<S, E, N, T>
where
    S: CredentialStore,
    E: SessionEstablisher,
    N: Navigator,
    T: Notifier,
{
    pub fn new(store: S, sessions: E, navigator: N, notifier: T) -> Self {
        Self::with_challenge(Challenge::new(), store, sessions, navigator, notifier)
    }

    pub fn with_challenge(
        challenge: Challenge,
        store: S,
        sessions: E,
        navigator: N,
        notifier: T,
    ) -> Self {
        Self {
            challenge: Arc::new(Mutex::new(challenge)),
            store,
            sessions,
            navigator,
            notifier,
            cancel: CancellationToken::new(),
            ticker: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> ChallengeUiState {
        self.lock().snapshot()
    }

    // ── Actions ─────────────────────────────────────────────────────────────

    pub async fn request_code(&self, email: Email) -> Result<Outcome, OtpError> {
        let command = self.lock().request_code(email);
        self.run(command).await
    }

    /// Replace the entered digits; auto-submits when six are present.
    pub async fn input(&self, value: &str) -> Result<Outcome, OtpError> {
        self.enter(|challenge| challenge.input(value)).await
    }

    pub async fn push_digit(&self, digit: char) -> Result<Outcome, OtpError> {
        self.enter(|challenge| challenge.push_digit(digit)).await
    }

    /// Manual submit; a no-op if the auto-submit already fired.
    pub async fn verify(&self) -> Result<Outcome, OtpError> {
        let command = {
            let mut challenge = self.lock();
            ensure_code_requested(&challenge)?;
            challenge.verify()
        };
        self.run(command).await
    }

    /// Request a replacement code; a no-op while the cooldown is running.
    pub async fn resend(&self) -> Result<Outcome, OtpError> {
        let command = {
            let mut challenge = self.lock();
            ensure_code_requested(&challenge)?;
            challenge.resend()
        };
        self.run(command).await
    }

    /// Stop the ticker and drop the results of any in-flight request.
    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Challenge> {
        self.challenge.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter<F>(&self, apply: F) -> Result<Outcome, OtpError>
    where
        F: FnOnce(&mut Challenge) -> Option<Command>,
    {
        let command = {
            let mut challenge = self.lock();
            ensure_code_requested(&challenge)?;
            if challenge.phase() != Phase::CodeSent {
                return Ok(Outcome::Ignored);
            }
            apply(&mut challenge)
        };
        match command {
            Some(command) => self.execute(command).await,
            None => Ok(Outcome::Pending),
        }
    }

    async fn run(&self, command: Option<Command>) -> Result<Outcome, OtpError> {
        match command {
            Some(command) => self.execute(command).await,
            None => Ok(Outcome::Ignored),
        }
    }

    async fn execute(&self, command: Command) -> Result<Outcome, OtpError> {
        match command {
            Command::Issue { email } => self.issue(email).await,
            Command::Redeem { email, code } => self.redeem(email, code).await,
        }
    }

    async fn issue(&self, email: Email) -> Result<Outcome, OtpError> {
        let result = self.store.issue_code(&email).await;
        if self.cancel.is_cancelled() {
            debug!(%email, "flow torn down, dropping issue result");
            return Ok(Outcome::Cancelled);
        }

        let resend = {
            let mut challenge = self.lock();
            let resend = challenge.phase() == Phase::Resending;
            if result.is_ok() {
                challenge.issue_succeeded();
            } else {
                challenge.issue_failed();
            }
            resend
        };

        match result {
            Ok(()) => {
                self.restart_ticker();
                self.notifier.notify(if resend {
                    Notice::CodeResent
                } else {
                    Notice::CodeSent
                });
                Ok(Outcome::CodeSent)
            }
            Err(e) => {
                warn!(error = ?e, %email, resend, "issuing code failed");
                self.notifier.notify(if resend {
                    Notice::ResendFailed
                } else {
                    Notice::SendFailed
                });
                Err(OtpError::SendFailed)
            }
        }
    }

    async fn redeem(&self, email: Email, code: OtpCode) -> Result<Outcome, OtpError> {
        let established = match self.store.redeem_code(&email, &code).await {
            Ok(()) if self.cancel.is_cancelled() => Ok(None),
            Ok(()) => self.sessions.establish(&email).await.map(Some),
            Err(e) => Err(e),
        };
        if self.cancel.is_cancelled() {
            debug!(%email, "flow torn down, dropping redemption result");
            return Ok(Outcome::Cancelled);
        }

        match established {
            Ok(Some(destination)) => {
                if !self.lock().redeem_succeeded() {
                    return Ok(Outcome::Ignored);
                }
                self.stop_ticker();
                self.notifier.notify(Notice::Verified);
                self.navigator.navigate(destination);
                Ok(Outcome::Verified(destination))
            }
            Ok(None) => Ok(Outcome::Cancelled),
            Err(e) => {
                warn!(error = ?e, %email, "verification failed");
                self.lock().redeem_failed();
                self.notifier.notify(Notice::VerifyFailed);
                Err(OtpError::VerifyFailed)
            }
        }
    }

    fn restart_ticker(&self) {
        let token = self.cancel.child_token();
        let previous = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let challenge = Arc::clone(&self.challenge);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            // First tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if tick_once(&challenge) {
                            break;
                        }
                    }
                }
            }
        });
    }

    fn stop_ticker(&self) {
        let current = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = current {
            token.cancel();
        }
    }
}

impl<S, E, N, T> Drop for OtpFlow<S, E, N, T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Advance the cooldown by one second. Returns `true` when the ticker should stop.
fn tick_once(challenge: &Mutex<Challenge>) -> bool {
    let mut challenge = challenge.lock().unwrap_or_else(PoisonError::into_inner);
    if challenge.tick() {
        debug!("resend cooldown elapsed");
        return true;
    }
    !matches!(
        challenge.phase(),
        Phase::CodeSent | Phase::Submitting | Phase::Resending
    )
}

fn ensure_code_requested(challenge: &Challenge) -> Result<(), OtpError> {
    match challenge.phase() {
        Phase::AwaitingEmail | Phase::Requesting => Err(OtpError::Unauthenticated),
        _ => Ok(()),
    }
}
