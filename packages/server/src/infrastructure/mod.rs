//! Infrastructure layer.
//!
//! Concrete implementations of the domain abstractions: the in-memory
//! registry, the WebSocket connection adapter, the wire DTOs and the
//! service registrar client.

pub mod dto;
pub mod inbox;
pub mod registrar;
pub mod registry;
pub mod websocket;
