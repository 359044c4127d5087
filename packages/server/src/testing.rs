//! Connection doubles shared by unit tests.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use crate::domain::{Connection, ConnectionId, DeliveryError};

/// How a [`FakeConnection`] reacts to writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBehavior {
    Accept,
    Fail,
    Hang,
}

/// In-memory connection that records every frame written to it.
pub struct FakeConnection {
    id: ConnectionId,
    behavior: WriteBehavior,
    sent: Mutex<Vec<String>>,
    closed: watch::Sender<bool>,
}

impl FakeConnection {
    pub fn new(behavior: WriteBehavior) -> Arc<Self> {
        let (closed, _) = watch::channel(false);
        Arc::new(Self {
            id: ConnectionId::generate(),
            behavior,
            sent: Mutex::new(Vec::new()),
            closed,
        })
    }

    pub fn accepting() -> Arc<Self> {
        Self::new(WriteBehavior::Accept)
    }

    pub async fn sent(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl Connection for FakeConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send_text(&self, text: String) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        match self.behavior {
            WriteBehavior::Accept => {
                self.sent.lock().await.push(text);
                Ok(())
            }
            WriteBehavior::Fail => Err(DeliveryError::Transport("connection reset".to_string())),
            WriteBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }

    async fn close(&self) {
        self.closed.send_replace(true);
    }

    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
