/// Connection Session Manager
///
/// Một ChatSession = một kênh logic persistent mang identity đã xác thực.
/// Session là value do caller sở hữu và truyền đi - không có socket global
/// ẩn trong context.
///
/// - `connect`: mở transport (bounded timeout) rồi bắt buộc hoàn thành
///   `join` handshake trước khi trả Session về
/// - receive loop: parse ServerMessage → dispatch table theo event kind
/// - transport rớt: reconnect với exponential backoff, re-issue `join`;
///   KHÔNG replay event bị miss - consumer re-fetch history để reconcile
/// - `close`: teardown deterministic, không handler nào chạy sau khi
///   close() trả về
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::client::event::{Dispatcher, EventHandler, EventKind, SessionEvent};
use crate::client::transport::{Connector, Transport};
use crate::modules::user::schema::UserRole;
use crate::modules::websocket::message::{ClientMessage, ServerMessage};

#[derive(Clone)]
pub struct SessionConfig {
    /// Access token cho join handshake
    pub token: String,
    pub connect_timeout: Duration,
    pub reconnect_base: Duration,
    pub reconnect_cap: Duration,
    pub max_reconnect_attempts: u32,
}

impl SessionConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            connect_timeout: Duration::from_secs(10),
            reconnect_base: Duration::from_secs(1),
            reconnect_cap: Duration::from_secs(30),
            max_reconnect_attempts: 5,
        }
    }
}

pub struct ChatSession {
    user_id: Uuid,
    role: UserRole,
    dispatcher: Arc<Mutex<Dispatcher>>,
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl ChatSession {
    /// Mở kênh và hoàn thành join handshake. Token sai → `Auth`;
    /// transport không mở được hoặc handshake quá timeout → `Network`.
    pub async fn connect(
        config: SessionConfig,
        connector: Arc<dyn Connector>,
        dispatcher: Dispatcher,
    ) -> Result<Self, ClientError> {
        let (transport, user_id, role) = handshake(connector.as_ref(), &config).await?;

        let dispatcher = Arc::new(Mutex::new(dispatcher));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(receive_loop(
            transport,
            config,
            connector,
            dispatcher.clone(),
            shutdown_rx,
            user_id,
            role.clone(),
        ));

        Ok(Self { user_id, role, dispatcher, shutdown: shutdown_tx, task })
    }

    /// Thay handler cho một event kind (tối đa một handler mỗi kind).
    pub fn on_event(&self, kind: EventKind, handler: EventHandler) {
        if let Ok(mut dispatcher) = self.dispatcher.lock() {
            dispatcher.register(kind, handler);
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn role(&self) -> &UserRole {
        &self.role
    }

    /// Teardown deterministic: receive loop thoát, transport đóng, và chỉ
    /// khi đó close() mới trả về - không còn handler invocation nào sau đó.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Mở transport + join handshake, cả hai đều nằm trong connect_timeout.
async fn handshake(
    connector: &dyn Connector,
    config: &SessionConfig,
) -> Result<(Box<dyn Transport>, Uuid, UserRole), ClientError> {
    let mut transport = tokio::time::timeout(config.connect_timeout, connector.connect())
        .await
        .map_err(|_| ClientError::Network("connect attempt timed out".to_string()))??;

    let join = serde_json::to_string(&ClientMessage::Join { token: config.token.clone() })
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    transport.send(join).await?;

    let deadline = Instant::now() + config.connect_timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let frame = tokio::time::timeout(remaining, transport.recv())
            .await
            .map_err(|_| ClientError::Network("join handshake timed out".to_string()))?;

        let Some(text) = frame else {
            return Err(ClientError::Network(
                "connection closed during join handshake".to_string(),
            ));
        };

        match serde_json::from_str::<ServerMessage>(&text) {
            Ok(ServerMessage::Connected { user_id, role }) => {
                return Ok((transport, user_id, role));
            }
            Ok(ServerMessage::ConnectionError { reason }) => {
                return Err(ClientError::Auth(reason));
            }
            // frame khác trước khi join xong - bỏ qua
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("Frame không parse được trong handshake: {}", e);
            }
        }
    }
}

async fn receive_loop(
    mut transport: Box<dyn Transport>,
    config: SessionConfig,
    connector: Arc<dyn Connector>,
    dispatcher: Arc<Mutex<Dispatcher>>,
    mut shutdown: watch::Receiver<bool>,
    user_id: Uuid,
    role: UserRole,
) {
    dispatch(&dispatcher, &SessionEvent::Connected { user_id, role });

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                transport.close().await;
                return;
            }

            frame = transport.recv() => {
                match frame {
                    Some(text) => handle_frame(&dispatcher, &text),
                    None => {
                        dispatch(&dispatcher, &SessionEvent::Disconnected);

                        match reconnect(&config, connector.as_ref(), &dispatcher, &mut shutdown)
                            .await
                        {
                            Some((fresh, user_id, role)) => {
                                transport = fresh;
                                dispatch(
                                    &dispatcher,
                                    &SessionEvent::Connected { user_id, role },
                                );
                            }
                            None => return,
                        }
                    }
                }
            }
        }
    }
}

fn handle_frame(dispatcher: &Arc<Mutex<Dispatcher>>, text: &str) {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(ServerMessage::NewMessage { message }) => {
            dispatch(dispatcher, &SessionEvent::Message(message));
        }
        Ok(ServerMessage::ConnectionError { reason }) => {
            dispatch(dispatcher, &SessionEvent::ConnectionError { reason });
        }
        // Connected ngoài handshake và Pong không cần tới consumer
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("Không thể parse server message: {} - raw: {}", e, text);
        }
    }
}

/// Reconnect với exponential backoff, tối đa max_reconnect_attempts lần.
/// Auth lỗi là fatal - dừng ngay. Hết số lần cho phép → ConnectionError persistent.
async fn reconnect(
    config: &SessionConfig,
    connector: &dyn Connector,
    dispatcher: &Arc<Mutex<Dispatcher>>,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<(Box<dyn Transport>, Uuid, UserRole)> {
    let mut backoff = config.reconnect_base;

    for attempt in 1..=config.max_reconnect_attempts {
        // ngủ hết backoff, trừ khi close() được gọi giữa chừng
        tokio::select! {
            _ = shutdown.changed() => return None,
            _ = tokio::time::sleep(backoff) => {}
        }

        match handshake(connector, config).await {
            Ok(ok) => return Some(ok),
            Err(ClientError::Auth(reason)) => {
                dispatch(dispatcher, &SessionEvent::ConnectionError { reason });
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    "Reconnect attempt {}/{} thất bại: {}",
                    attempt,
                    config.max_reconnect_attempts,
                    e
                );
            }
        }

        backoff = (backoff * 2).min(config.reconnect_cap);
    }

    dispatch(
        dispatcher,
        &SessionEvent::ConnectionError {
            reason: "reconnect attempts exhausted".to_string(),
        },
    );
    None
}

fn dispatch(dispatcher: &Arc<Mutex<Dispatcher>>, event: &SessionEvent) {
    if let Ok(mut guard) = dispatcher.lock() {
        guard.dispatch(event);
    }
}
