//! Domain types shared by the Bookly sign-in client and the auth service.

pub mod destination;
pub mod email;
pub mod otp;
