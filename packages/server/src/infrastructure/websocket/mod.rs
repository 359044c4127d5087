//! WebSocket transport adapters.

pub mod connection;

pub use connection::WsConnection;
