//! WebSocket connection handlers.
//!
//! One receive loop per connection: it registers the connection, forwards
//! decoded frames to the inbox, and always unregisters on the way out.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::ORIGIN},
    response::IntoResponse,
};
use futures_util::stream::{Stream, StreamExt};

use crate::{
    domain::{Connection, ConnectionId},
    infrastructure::websocket::WsConnection,
    ui::state::AppState,
    usecase::{
        ClientSession, ConnectClientUseCase, DisconnectClientUseCase, InboundFrame,
        ReceiveFrameUseCase,
    },
};

/// Why a receive loop ended.
#[derive(Debug)]
enum CloseReason {
    /// The client sent a close frame.
    RemoteClosed,
    /// The stream ended without a close frame.
    StreamEnded,
    ReadError(axum::Error),
    /// The hub evicted the connection after a failed write.
    Evicted,
    /// The hub is gone.
    InboxClosed,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    if !state.origin_policy.is_allowed(origin) {
        tracing::warn!(origin = origin.unwrap_or("-"), "rejecting upgrade from disallowed origin");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(ws
        .on_failed_upgrade(|e| tracing::warn!(error = %e, "websocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, state)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sink, stream) = socket.split();
    let connection = Arc::new(WsConnection::new(ConnectionId::generate(), sink));

    let mut session = ConnectClientUseCase::new(state.registry.clone())
        .execute(connection.clone())
        .await;

    let reason = receive_loop(&state, &mut session, connection.as_ref(), stream).await;
    tracing::debug!(connection_id = %session.id(), ?reason, "receive loop ended");

    // Runs on every exit path of the loop.
    DisconnectClientUseCase::new(state.registry.clone())
        .execute(connection.as_ref())
        .await;
}

async fn receive_loop<S>(
    state: &AppState,
    session: &mut ClientSession,
    connection: &dyn Connection,
    mut stream: S,
) -> CloseReason
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
{
    let usecase = ReceiveFrameUseCase::new(state.registry.clone(), state.inbox.clone());

    loop {
        let next = tokio::select! {
            _ = connection.closed() => return CloseReason::Evicted,
            next = stream.next() => next,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => return CloseReason::ReadError(e),
            None => return CloseReason::StreamEnded,
        };

        let frame = match &message {
            Message::Text(text) => InboundFrame::Text(text.as_str()),
            Message::Binary(bytes) => InboundFrame::Binary(bytes.as_ref()),
            Message::Close(_) => return CloseReason::RemoteClosed,
            // Pongs are sent by the protocol layer.
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        if usecase.execute(session, frame).await.is_err() {
            return CloseReason::InboxClosed;
        }
    }
}
