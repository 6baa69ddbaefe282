//! Async client for the dashboard backend.
//!
//! Exposes the three session operations the bootstrap controller depends on
//! ([`RemoteClient::initialize`], [`RemoteClient::current_identity`],
//! [`RemoteClient::sign_in_anonymously`]), a cheap health round-trip
//! ([`RemoteClient::ping`]), and the per-domain reads used by live
//! repositories.

pub mod client;
mod domains;
pub mod error;
pub mod models;
mod session;
pub mod transport;

pub use client::{Identity, RemoteClient};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
