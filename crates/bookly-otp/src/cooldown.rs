use bookly_domain::otp::RESEND_COOLDOWN_SECS;

/// Resend cooldown counter, advanced by one-second ticks.
///
/// Purely presentational: it says nothing about whether the issued code is
/// still valid server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    remaining: u32,
    full: u32,
}

impl Cooldown {
    pub fn new(full: u32) -> Self {
        Self {
            remaining: full,
            full,
        }
    }

    pub fn restart(&mut self) {
        self.remaining = self.full;
    }

    /// Advance one second. Returns `true` only on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn can_resend(&self) -> bool {
        self.remaining == 0
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new(RESEND_COOLDOWN_SECS)
    }
}
