//! Shared helpers for integration tests: an in-process relay server and a
//! small WebSocket client wrapper.

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use relay_server::{
    Config,
    domain::{Connection, ConnectionId, DeliveryError},
    ui::{build_app, state::AppState},
};
use tokio::{net::TcpListener, sync::Notify, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest, http::HeaderValue},
};

pub type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Relay server listening on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    server: JoinHandle<()>,
    hub: JoinHandle<()>,
}

impl TestServer {
    /// Start a server configured with `args` (as if passed on the command line).
    pub async fn start(args: &[&str]) -> Self {
        let mut argv = vec!["relay-server"];
        argv.extend_from_slice(args);
        let config = Config::try_parse_from(argv).expect("Failed to parse config");
        config.validate().expect("Invalid test config");

        let app = build_app(&config, None).expect("Failed to build app");
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let router = app.router;
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });

        Self {
            addr,
            state: app.state,
            server,
            hub: app.hub,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn connection_count(&self) -> usize {
        self.state.registry.len().await
    }

    /// Wait until the registry holds exactly `expected` connections.
    pub async fn wait_for_connections(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let count = self.connection_count().await;
            if count == expected {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {expected} connections, registry has {count}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Connect a client and wait for it to be registered.
    pub async fn connect(&self) -> WsClient {
        let before = self.connection_count().await;
        let (client, _) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect");
        self.wait_for_connections(before + 1).await;
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
        self.hub.abort();
    }
}

/// Connect to `url` sending the given `Origin` header.
pub async fn connect_with_origin(
    url: &str,
    origin: &'static str,
) -> Result<WsClient, tokio_tungstenite::tungstenite::Error> {
    let mut request = url.into_client_request()?;
    request
        .headers_mut()
        .insert("Origin", HeaderValue::from_static(origin));
    connect_async(request).await.map(|(client, _)| client)
}

pub async fn send_text(client: &mut WsClient, payload: &str) {
    client
        .send(Message::Text(payload.into()))
        .await
        .expect("Failed to send");
}

/// Next text frame, or `None` if nothing arrives in time.
pub async fn recv_text(client: &mut WsClient) -> Option<String> {
    recv_text_within(client, RECV_TIMEOUT).await
}

pub async fn recv_text_within(client: &mut WsClient, wait: Duration) -> Option<String> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, client.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => return Some(text.as_str().to_string()),
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => continue,
            _ => return None,
        }
    }
}

/// Assert that no text frame arrives for a short while.
pub async fn assert_silent(client: &mut WsClient) {
    let received = recv_text_within(client, Duration::from_millis(200)).await;
    assert_eq!(received, None, "unexpected frame");
}

/// How a [`StalledPeer`] fails its writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// Every write errors out immediately.
    Broken,
    /// Every write blocks forever.
    Hung,
}

/// A registered peer whose outbound writes never succeed.
///
/// Registered straight into the server's registry, it stands in for a client
/// whose transport died after the upgrade.
pub struct StalledPeer {
    id: ConnectionId,
    stall: Stall,
    attempts: AtomicUsize,
    closed: AtomicBool,
    close_notify: Notify,
}

impl StalledPeer {
    pub fn new(stall: Stall) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::generate(),
            stall,
            attempts: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
        })
    }

    pub fn write_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for StalledPeer {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send_text(&self, _text: String) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.stall {
            Stall::Broken => Err(DeliveryError::Transport("broken pipe".to_string())),
            Stall::Hung => std::future::pending().await,
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.close_notify.notify_waiters();
    }

    async fn closed(&self) {
        let notified = self.close_notify.notified();
        if !self.is_closed() {
            notified.await;
        }
    }
}
