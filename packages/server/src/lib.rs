//! Real-time WebSocket message relay.
//!
//! Clients hold a persistent WebSocket connection and send small JSON
//! messages; the server fans each message out to the other connected clients.
//!
//! The core is two pieces:
//!
//! - the connection registry ([`domain::ConnectionRegistry`]), the
//!   synchronized set of live connections and their display names;
//! - the broadcast [`hub::Hub`], a single dispatch loop that drains the inbox
//!   and writes each message to its recipients, evicting any recipient whose
//!   write fails.

pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

#[cfg(test)]
mod testing;

// Re-export entry points
pub use config::Config;
pub use error::ServerError;
pub use ui::run as run_server;
