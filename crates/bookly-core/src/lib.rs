//! Service plumbing shared by Bookly HTTP services: health probes, request-id and
//! trace layers, tracing setup and serde helpers.

pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
