pub mod otp;
pub mod outbox;
pub mod session;
