//! WebSocket test client for protocol testing
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for an expected message
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Game client speaking the JSON envelope protocol
pub struct GameClient {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl GameClient {
    /// Connect to WebSocket endpoint
    pub async fn connect(addr: SocketAddr) -> Self {
        let url = format!("ws://{}/ws", addr);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("Failed to connect");
        let (sink, stream) = ws.split();
        Self { sink, stream }
    }

    /// Connect and send JOIN
    #[allow(dead_code)]
    pub async fn join(addr: SocketAddr, username: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client
            .send_json(&json!({"type": "JOIN", "payload": {"username": username}}))
            .await;
        client
    }

    /// Send raw text message
    pub async fn send_raw(&mut self, msg: &str) {
        self.sink
            .send(Message::Text(msg.to_string().into()))
            .await
            .unwrap();
    }

    /// Send JSON message
    pub async fn send_json(&mut self, msg: &Value) {
        let json = serde_json::to_string(msg).unwrap();
        self.send_raw(&json).await;
    }

    /// Send MOVE for a column
    #[allow(dead_code)]
    pub async fn play(&mut self, column: i64) {
        self.send_json(&json!({"type": "MOVE", "payload": {"column": column}}))
            .await;
    }

    /// Next text frame, or None once the server closed the socket
    pub async fn next_text(&mut self) -> Option<String> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Receive the next message as JSON
    pub async fn recv(&mut self) -> Value {
        let text = tokio::time::timeout(RECV_TIMEOUT, self.next_text())
            .await
            .expect("Timed out waiting for message")
            .expect("WebSocket closed");
        serde_json::from_str(&text).expect("Failed to parse JSON")
    }

    /// Skip messages until one with the given type arrives
    #[allow(dead_code)]
    pub async fn recv_type(&mut self, msg_type: &str) -> Value {
        loop {
            let msg = self.recv().await;
            if msg["type"] == msg_type {
                return msg;
            }
        }
    }

    /// True if the server closes the socket within the timeout
    #[allow(dead_code)]
    pub async fn expect_closed(&mut self) -> bool {
        matches!(
            tokio::time::timeout(RECV_TIMEOUT, self.next_text()).await,
            Ok(None)
        )
    }

    /// Close the connection from the client side
    #[allow(dead_code)]
    pub async fn close(mut self) {
        let _ = self.sink.close().await;
    }
}
