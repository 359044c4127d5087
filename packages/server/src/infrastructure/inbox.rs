//! Inbox: the bounded FIFO queue between receive loops and the dispatch loop.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{
    self,
    error::{SendTimeoutError, TrySendError},
};

use crate::domain::Envelope;

/// What `enqueue` does when the inbox is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Block the sender until there is room, at most for the given duration.
    Wait(Duration),
    /// Fail immediately.
    Reject,
}

/// Errors returned by [`Inbox::enqueue`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("inbox is full")]
    Full,

    #[error("inbox is closed")]
    Closed,
}

/// Sending half of the inbox. Cheap to clone; one clone per receive loop.
#[derive(Debug, Clone)]
pub struct Inbox {
    tx: mpsc::Sender<Envelope>,
    policy: OverflowPolicy,
}

/// Receiving half of the inbox, owned by the hub.
#[derive(Debug)]
pub struct InboxReceiver {
    rx: mpsc::Receiver<Envelope>,
}

/// Create an inbox holding at most `capacity` pending messages.
///
/// # Panics
///
/// Panics if `capacity` is 0; configuration validation rejects that value.
pub fn inbox(capacity: usize, policy: OverflowPolicy) -> (Inbox, InboxReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (Inbox { tx, policy }, InboxReceiver { rx })
}

impl Inbox {
    /// Append `envelope` to the queue.
    pub async fn enqueue(&self, envelope: Envelope) -> Result<(), EnqueueError> {
        match self.policy {
            OverflowPolicy::Wait(timeout) => {
                self.tx
                    .send_timeout(envelope, timeout)
                    .await
                    .map_err(|e| match e {
                        SendTimeoutError::Timeout(_) => EnqueueError::Full,
                        SendTimeoutError::Closed(_) => EnqueueError::Closed,
                    })
            }
            OverflowPolicy::Reject => self.tx.try_send(envelope).map_err(|e| match e {
                TrySendError::Full(_) => EnqueueError::Full,
                TrySendError::Closed(_) => EnqueueError::Closed,
            }),
        }
    }

    /// Number of messages that can be enqueued right now without waiting.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl InboxReceiver {
    /// Next message in FIFO order; `None` once every [`Inbox`] is dropped and
    /// the queue is drained.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Stop accepting new messages. Already queued messages can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}
