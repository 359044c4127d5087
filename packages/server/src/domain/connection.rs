//! Outbound side of a live client connection.

use async_trait::async_trait;

use super::{error::DeliveryError, value_object::ConnectionId};

/// A live connection as seen by the registry and the hub.
///
/// The receive loop that accepted the connection owns its lifecycle; the
/// registry only keeps a shared handle for routing. Implementations must
/// tolerate `close` being called more than once and from any task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connection: Send + Sync {
    /// Identity of this connection.
    fn id(&self) -> ConnectionId;

    /// Write one text frame. No retry.
    async fn send_text(&self, text: String) -> Result<(), DeliveryError>;

    /// Close the underlying stream. Best-effort; secondary errors are ignored.
    async fn close(&self);

    /// Resolves once `close` has been called.
    async fn closed(&self);
}
