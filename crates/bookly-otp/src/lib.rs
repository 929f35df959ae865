//! Email one-time-passcode sign-in flow.
//!
//! [`challenge::Challenge`] is the synchronous state machine: every user action
//! and timer tick is a method call that either changes state or is rejected by
//! a guard, and network work comes back as a [`challenge::Command`].
//! [`flow::OtpFlow`] drives it against the collaborator ports in [`ports`],
//! owns the one-second cooldown ticker, and drops responses that arrive after
//! teardown. [`http::AuthClient`] implements the ports against the auth service.

pub mod challenge;
pub mod cooldown;
pub mod error;
pub mod flow;
pub mod http;
pub mod ports;

pub use challenge::{Challenge, ChallengeUiState, Command, Phase};
pub use error::OtpError;
pub use flow::{OtpFlow, Outcome};
pub use ports::{CredentialStore, Navigator, Notice, Notifier, SessionEstablisher};
