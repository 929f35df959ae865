#![allow(async_fn_in_trait)]

use std::fmt;

use bookly_domain::destination::Destination;
use bookly_domain::email::Email;
use bookly_domain::otp::OtpCode;

/// Issues and redeems one-time codes.
///
/// Implementations uphold two invariants the flow relies on but does not check:
/// issuing a code invalidates any earlier code for the same email, and a code
/// redeems at most once.
pub trait CredentialStore: Send + Sync {
    /// Issue a fresh code and have it emailed.
    async fn issue_code(&self, email: &Email) -> anyhow::Result<()>;

    /// Redeem `code`. Fails if it is wrong, expired, superseded or already used.
    async fn redeem_code(&self, email: &Email, code: &OtpCode) -> anyhow::Result<()>;
}

/// Turns a successful redemption into a usable session.
pub trait SessionEstablisher: Send + Sync {
    /// Refresh the session for `email` and report where the user should land.
    async fn establish(&self, email: &Email) -> anyhow::Result<Destination>;
}

/// Navigation host.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: Destination);
}

/// User-visible, non-blocking notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    CodeSent,
    CodeResent,
    Verified,
    SendFailed,
    ResendFailed,
    VerifyFailed,
}

impl Notice {
    pub fn is_error(self) -> bool {
        matches!(self, Self::SendFailed | Self::ResendFailed | Self::VerifyFailed)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CodeSent => "Email sent",
            Self::CodeResent => "Verification code sent again",
            Self::Verified => "Email verified",
            Self::SendFailed => "Error sending email",
            Self::ResendFailed => "Error resending code",
            Self::VerifyFailed => "Error verifying Email/OTP",
        })
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            tracing::warn!(?notice, "{notice}");
        } else {
            tracing::info!(?notice, "{notice}");
        }
    }
}
