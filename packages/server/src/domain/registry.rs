//! Connection registry abstraction.

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    connection::Connection,
    value_object::{ConnectionId, DisplayName, Timestamp},
};

/// One registered connection as returned by [`ConnectionRegistry::snapshot`].
#[derive(Clone)]
pub struct RegistryEntry {
    pub connection: Arc<dyn Connection>,
    pub name: Option<DisplayName>,
    pub connected_at: Timestamp,
}

impl RegistryEntry {
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("id", &self.id())
            .field("name", &self.name)
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

/// The set of currently connected clients.
///
/// All access is serialized by the implementation. No method performs I/O on
/// a connection while holding the registry lock.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Add `connection` with no display name. Registering the same id again
    /// replaces the entry and clears its name.
    async fn register(&self, connection: Arc<dyn Connection>);

    /// Set the display name of a registered connection. No-op for unknown ids.
    async fn set_name(&self, id: ConnectionId, name: DisplayName);

    /// Remove a connection. Returns whether it was present; removing an absent
    /// id is not an error.
    async fn unregister(&self, id: ConnectionId) -> bool;

    /// Point-in-time copy of all entries, ordered by connect time.
    async fn snapshot(&self) -> Vec<RegistryEntry>;

    /// Number of registered connections.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
