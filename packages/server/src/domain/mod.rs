//! Domain layer for the relay.
//!
//! This module contains the message model, the connection and registry
//! abstractions, and the routing policy. It does not depend on the
//! transport or on any concrete storage.

pub mod connection;
pub mod error;
pub mod message;
pub mod registry;
pub mod routing;
pub mod value_object;

pub use connection::Connection;
#[cfg(test)]
pub use connection::MockConnection;
pub use error::{DecodeError, DeliveryError, ValueObjectError};
pub use message::{ChatMessage, Envelope, MessageKind};
pub use registry::{ConnectionRegistry, RegistryEntry};
pub use routing::RoutingPolicy;
pub use value_object::{ConnectionId, DisplayName, MessageText, Timestamp};
