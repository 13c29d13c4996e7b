/// Transport trừu tượng cho kênh live.
///
/// Session manager chỉ cần send/recv text frame; implementation thật chạy
/// trên tokio-tungstenite, tests dùng mock. `recv` trả None khi transport
/// đứt (close frame, lỗi protocol, hoặc stream kết thúc) - session manager
/// coi mọi trường hợp như nhau và đi vào reconnect.
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

use crate::client::error::ClientError;

#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: String) -> Result<(), ClientError>;
    async fn recv(&mut self) -> Option<String>;
    async fn close(&mut self);
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Transport>, ClientError>;
}

/// Connector thật trên WebSocket
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, ClientError> {
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Box::new(WsTransport { stream }))
    }
}

pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<(), ClientError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Option<String> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Close(_)) => return None,
                // ping/pong/binary không mang protocol message
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
