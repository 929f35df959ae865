//! One-time passcode values and timing constants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of digits in a one-time passcode.
pub const OTP_LEN: usize = 6;

/// Server-side lifetime of an issued code in seconds (10 minutes).
pub const OTP_TTL_SECS: i64 = 600;

/// Client-side wait before another code may be requested, in seconds.
pub const RESEND_COOLDOWN_SECS: u32 = 60;

const _: () = assert!(OTP_TTL_SECS > RESEND_COOLDOWN_SECS as i64);

/// Error returned when a string is not a well-formed passcode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("passcode must be exactly {OTP_LEN} digits")]
pub struct InvalidOtpCode;

/// A complete passcode: exactly [`OTP_LEN`] ASCII digits.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OtpCode(String);

impl OtpCode {
    pub fn parse(raw: &str) -> Result<Self, InvalidOtpCode> {
        if raw.len() == OTP_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(InvalidOtpCode)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OtpCode {
    type Error = InvalidOtpCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OtpCode> for String {
    fn from(code: OtpCode) -> Self {
        code.0
    }
}

// Digits never appear in debug output.
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}
