/// Failures surfaced by [`crate::flow::OtpFlow`].
///
/// None of these are fatal: the flow is always back in an interactive phase
/// when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    /// Issuing or re-issuing a code failed.
    #[error("failed to send verification code")]
    SendFailed,
    /// The code was wrong, expired or already used; the store does not say which.
    #[error("invalid or expired code")]
    VerifyFailed,
    /// A code action was attempted before any code was sent.
    #[error("no verification code has been requested")]
    Unauthenticated,
}
