//! sea-orm entities for the auth service database.

pub mod otp_challenges;
pub mod outbox_events;
pub mod users;
