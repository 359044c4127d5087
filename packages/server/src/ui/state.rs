//! Server state and connection management.

use std::sync::Arc;

use crate::{domain::ConnectionRegistry, infrastructure::inbox::Inbox};

/// Which `Origin` headers may open a WebSocket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Accept every request, with or without an `Origin` header. Insecure.
    AllowAll,
    /// Accept only requests whose `Origin` is listed.
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// An empty list means accept all.
    pub fn from_allowed(origins: Vec<String>) -> Self {
        let origins: Vec<String> = origins
            .into_iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if origins.is_empty() {
            Self::AllowAll
        } else {
            Self::AllowList(origins)
        }
    }

    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        match self {
            Self::AllowAll => true,
            Self::AllowList(allowed) => origin
                .map(|o| o.trim_end_matches('/'))
                .is_some_and(|o| allowed.iter().any(|a| a == o)),
        }
    }
}

/// Shared application state
pub struct AppState {
    /// Registry of live connections (shared with the hub)
    pub registry: Arc<dyn ConnectionRegistry>,
    /// Sending half of the hub's inbox; cloned into every receive loop
    pub inbox: Inbox,
    /// Origin check applied before upgrade
    pub origin_policy: OriginPolicy,
}

impl AppState {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        inbox: Inbox,
        origin_policy: OriginPolicy,
    ) -> Self {
        Self {
            registry,
            inbox,
            origin_policy,
        }
    }
}
