//! WebSocket relay server: HTTP routing, the per-connection receive loop and
//! process startup.

mod handler;
pub mod router;
mod runner;
mod signal;
pub mod state;

pub use runner::{App, build_app, run};
