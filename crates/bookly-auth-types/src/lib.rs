//! Session types shared by Bookly services.
//!
//! Provides the session cookie builders, session-token validation and the
//! `SessionUser` extractor.

pub mod cookie;
pub mod session;
pub mod token;
