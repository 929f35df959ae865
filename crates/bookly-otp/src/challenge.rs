//! Synchronous OTP challenge state machine.
//!
//! No I/O happens here. Actions that need the credential store return a
//! [`Command`]; the caller runs it and reports back through the matching
//! `*_succeeded` / `*_failed` method. Returning `None` means the guard
//! rejected the action and nothing must be sent.

use bookly_domain::email::Email;
use bookly_domain::otp::{OTP_LEN, OtpCode};

use crate::cooldown::Cooldown;

/// Where the challenge currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No code requested yet.
    AwaitingEmail,
    /// First code request in flight.
    Requesting,
    /// A code is outstanding; digits may be entered.
    CodeSent,
    /// Redemption of the entered digits in flight.
    Submitting,
    /// Replacement code request in flight.
    Resending,
    /// Terminal.
    Verified,
}

impl Phase {
    /// Phases in which an issued code is outstanding and the cooldown runs.
    fn has_code(self) -> bool {
        matches!(self, Self::CodeSent | Self::Submitting | Self::Resending)
    }
}

/// Network work requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Issue { email: Email },
    Redeem { email: Email, code: OtpCode },
}

/// Read-only view for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeUiState {
    pub phase: Phase,
    pub email: Option<Email>,
    pub digits: String,
    pub pending: bool,
    pub resend_pending: bool,
    pub seconds_until_resend_allowed: u32,
    pub can_resend: bool,
}

#[derive(Debug, Clone)]
pub struct Challenge {
    phase: Phase,
    email: Option<Email>,
    digits: String,
    cooldown: Cooldown,
}

impl Default for Challenge {
    fn default() -> Self {
        Self::new()
    }
}

impl Challenge {
    pub fn new() -> Self {
        Self::with_cooldown(Cooldown::default())
    }

    pub fn with_cooldown(cooldown: Cooldown) -> Self {
        Self {
            phase: Phase::AwaitingEmail,
            email: None,
            digits: String::new(),
            cooldown,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn can_resend(&self) -> bool {
        self.phase.has_code() && self.cooldown.can_resend()
    }

    // ── Initial send ────────────────────────────────────────────────────────

    pub fn request_code(&mut self, email: Email) -> Option<Command> {
        if self.phase != Phase::AwaitingEmail {
            return None;
        }
        self.phase = Phase::Requesting;
        self.email = Some(email.clone());
        Some(Command::Issue { email })
    }

    /// A code was issued, either the first one or a replacement.
    pub fn issue_succeeded(&mut self) -> bool {
        match self.phase {
            Phase::Requesting | Phase::Resending => {
                self.phase = Phase::CodeSent;
                self.digits.clear();
                self.cooldown.restart();
                true
            }
            _ => false,
        }
    }

    pub fn issue_failed(&mut self) -> bool {
        match self.phase {
            Phase::Requesting => {
                self.phase = Phase::AwaitingEmail;
                true
            }
            Phase::Resending => {
                self.phase = Phase::CodeSent;
                true
            }
            _ => false,
        }
    }

    // ── Digit entry and redemption ──────────────────────────────────────────

    /// Replace the entered digits. Non-digits are dropped and the value is
    /// capped at [`OTP_LEN`]. Auto-submits once the entry is complete.
    pub fn input(&mut self, value: &str) -> Option<Command> {
        if self.phase != Phase::CodeSent {
            return None;
        }
        self.digits = value
            .chars()
            .filter(char::is_ascii_digit)
            .take(OTP_LEN)
            .collect();
        self.verify()
    }

    pub fn push_digit(&mut self, digit: char) -> Option<Command> {
        if self.phase != Phase::CodeSent || !digit.is_ascii_digit() {
            return None;
        }
        if self.digits.len() < OTP_LEN {
            self.digits.push(digit);
        }
        self.verify()
    }

    pub fn pop_digit(&mut self) {
        if self.phase == Phase::CodeSent {
            self.digits.pop();
        }
    }

    /// Manual submit. Shares its guard with the auto-submit in [`Self::input`],
    /// so a complete entry produces at most one redemption.
    pub fn verify(&mut self) -> Option<Command> {
        if self.phase != Phase::CodeSent || self.digits.len() != OTP_LEN {
            return None;
        }
        let email = self.email.clone()?;
        let code = OtpCode::parse(&self.digits).ok()?;
        self.phase = Phase::Submitting;
        Some(Command::Redeem { email, code })
    }

    pub fn redeem_succeeded(&mut self) -> bool {
        if self.phase != Phase::Submitting {
            return false;
        }
        self.phase = Phase::Verified;
        true
    }

    /// Rejected code: clear the entry, keep the cooldown where it was.
    pub fn redeem_failed(&mut self) -> bool {
        if self.phase != Phase::Submitting {
            return false;
        }
        self.phase = Phase::CodeSent;
        self.digits.clear();
        true
    }

    // ── Resend ──────────────────────────────────────────────────────────────

    pub fn resend(&mut self) -> Option<Command> {
        if self.phase != Phase::CodeSent || !self.cooldown.can_resend() {
            return None;
        }
        let email = self.email.clone()?;
        self.phase = Phase::Resending;
        Some(Command::Issue { email })
    }

    /// One elapsed second. Returns `true` on the tick where resend becomes allowed.
    pub fn tick(&mut self) -> bool {
        if !self.phase.has_code() {
            return false;
        }
        self.cooldown.tick()
    }

    pub fn snapshot(&self) -> ChallengeUiState {
        ChallengeUiState {
            phase: self.phase,
            email: self.email.clone(),
            digits: self.digits.clone(),
            pending: matches!(self.phase, Phase::Requesting | Phase::Submitting),
            resend_pending: self.phase == Phase::Resending,
            seconds_until_resend_allowed: self.cooldown.remaining(),
            can_resend: self.can_resend(),
        }
    }
}
