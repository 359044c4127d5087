//! [`Connection`] implementation over a WebSocket sink.

use std::{fmt::Display, time::Duration};

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    sink::{Sink, SinkExt},
    stream::SplitSink,
};
use tokio::sync::{Mutex, watch};

use crate::domain::{Connection, ConnectionId, DeliveryError};

/// Upper bound on sending the close frame of an evicted connection.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Write half of an upgraded WebSocket, shared between the registry and the
/// receive loop that owns the connection.
pub struct WsConnection<S = SplitSink<WebSocket, Message>> {
    id: ConnectionId,
    sink: Mutex<S>,
    closed: watch::Sender<bool>,
}

impl<S> WsConnection<S> {
    pub fn new(id: ConnectionId, sink: S) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            id,
            sink: Mutex::new(sink),
            closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl<S> Connection for WsConnection<S>
where
    S: Sink<Message> + Send + Unpin,
    S::Error: Display + Send,
{
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send_text(&self, text: String) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text.into()))
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }

    async fn close(&self) {
        // Only the first caller sends the close frame.
        if self.closed.send_replace(true) {
            return;
        }
        let mut sink = self.sink.lock().await;
        match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(connection_id = %self.id, error = %e, "close failed"),
            Err(_) => tracing::debug!(connection_id = %self.id, "close timed out"),
        }
    }

    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
