//! Shared utilities for the relay server.

pub mod logger;
pub mod time;
