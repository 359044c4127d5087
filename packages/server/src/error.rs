//! Startup-fatal errors.
//!
//! Transport, decode and delivery errors are local to one connection and never
//! reach this level; see [`crate::domain::error`].

use thiserror::Error;

/// Errors that abort the process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load config file {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("service registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Errors from the external service registrar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("error sending registration request: {0}")]
    Request(String),

    #[error("received non-OK response status: {0}")]
    Status(u16),
}
