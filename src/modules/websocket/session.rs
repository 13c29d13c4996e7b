/// WebSocket Session Actor
///
/// Mỗi WebSocket connection có một Session actor riêng. Session giữ identity
/// sau join handshake và gửi messages tới client qua mpsc channel được
/// bridge từ handler.rs.
///
/// Async operations (DB calls) sử dụng `ctx.spawn()` + `into_actor()`.
use actix::prelude::*;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::conversation::repository_pg::ConversationRepositoryPg;
use crate::modules::message::repository_pg::MessageRepositoryPg;
use crate::modules::message::service::MessageService;
use crate::modules::user::repository_pg::UserRepositoryPg;
use crate::modules::user::schema::UserRole;
use crate::utils::Claims;
use crate::ENV;

use super::events::{Connect, Disconnect, Join};
use super::message::{ClientMessage, ServerMessage};
use super::server::ChatServer;

/// Type alias cho MessageService với concrete repository types
pub type MessageSvc = MessageService<MessageRepositoryPg, ConversationRepositoryPg, UserRepositoryPg>;

/// Session cho một client trên kênh live
pub struct WsChatSession {
    /// Unique session ID
    pub id: Uuid,

    /// Identity sau khi join handshake (None nếu chưa join)
    pub identity: Option<(Uuid, UserRole)>,

    /// Address của chat server actor
    pub server: Addr<ChatServer>,

    /// Channel gửi JSON messages tới client (bridge → handler.rs → WebSocket)
    pub tx: mpsc::UnboundedSender<String>,

    /// Message service để persist messages (None trong test environment)
    pub message_service: Option<actix_web::web::Data<MessageSvc>>,
}

impl WsChatSession {
    pub fn new(
        server: Addr<ChatServer>,
        tx: mpsc::UnboundedSender<String>,
        message_service: actix_web::web::Data<MessageSvc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            identity: None,
            server,
            tx,
            message_service: Some(message_service),
        }
    }

    /// Gửi ServerMessage tới client thông qua channel
    fn send_to_client(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = self.tx.send(json) {
                    tracing::error!(
                        "Không thể gửi message tới client (session {}): {}",
                        self.id,
                        e
                    );
                }
            }
            Err(e) => {
                tracing::error!("Không thể serialize ServerMessage (session {}): {}", self.id, e);
            }
        }
    }

    fn send_connection_error(&self, reason: &str) {
        self.send_to_client(&ServerMessage::ConnectionError { reason: reason.to_string() });
    }

    /// Kiểm tra session đã join chưa, trả về identity nếu có
    fn require_join(&self) -> Option<(Uuid, UserRole)> {
        if self.identity.is_none() {
            self.send_connection_error("Bạn cần join trước khi gửi tin nhắn");
            tracing::warn!("Session {} chưa join, từ chối request", self.id);
        }
        self.identity.clone()
    }

    /// Dispatch message từ client tới handler tương ứng
    fn handle_client_message(&mut self, msg: &ClientMessage, ctx: &mut Context<Self>) {
        match msg {
            ClientMessage::Join { token } => {
                self.handle_join(token, ctx);
            }

            ClientMessage::Send { target_id, body } => {
                self.handle_send(*target_id, body.clone(), ctx);
            }

            ClientMessage::Ping => {
                self.send_to_client(&ServerMessage::Pong);
            }
        }
    }

    /// Join handshake: verify token và map identity → session.
    /// Auth thất bại là fatal cho connection attempt - đóng session.
    fn handle_join(&mut self, token: &str, ctx: &mut Context<Self>) {
        if self.identity.is_some() {
            self.send_connection_error("Session đã join rồi");
            return;
        }

        let claims = match Claims::decode(token, ENV.jwt_secret.as_ref()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("Join handshake thất bại (session {}): {}", self.id, e);
                self.send_connection_error("Token không hợp lệ hoặc đã hết hạn");
                ctx.stop();
                return;
            }
        };

        let user_id = claims.sub;
        let role = claims.role;

        self.identity = Some((user_id, role.clone()));

        self.server.do_send(Join { session_id: self.id, user_id, role: role.clone() });

        self.send_to_client(&ServerMessage::Connected { user_id, role });

        tracing::info!("Identity {} joined thành công trên session {}", user_id, self.id);
    }

    /// Gửi tin nhắn qua kênh live - cùng service path với POST /messages,
    /// nên hai entry point chia sẻ đúng một bộ invariant.
    fn handle_send(&self, target_id: Option<Uuid>, body: String, ctx: &mut Context<Self>) {
        let Some((user_id, role)) = self.require_join() else {
            return;
        };

        let Some(service) = self.message_service.clone() else {
            self.send_connection_error("Message service không khả dụng");
            return;
        };

        let tx = self.tx.clone();
        let session_id = self.id;

        ctx.spawn(
            async move {
                if let Err(e) = service.send(user_id, role, target_id, body).await {
                    tracing::error!("Lỗi lưu message (session {}): {}", session_id, e);

                    let err_msg = ServerMessage::ConnectionError { reason: send_error_reason(&e) };
                    if let Ok(json) = serde_json::to_string(&err_msg) {
                        let _ = tx.send(json);
                    }
                }
                // Thành công: RouteMessage từ service đã lo broadcast
            }
            .into_actor(self),
        );
    }
}

/// Lỗi hiển thị cho client: giữ message của validation/not-found,
/// che chi tiết internal.
fn send_error_reason(e: &error::SystemError) -> String {
    match e {
        error::SystemError::BadRequest(msg) | error::SystemError::NotFound(msg) => msg.to_string(),
        _ => "Không thể gửi tin nhắn. Vui lòng thử lại.".to_string(),
    }
}

impl Actor for WsChatSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!("WebSocket session started: {}", self.id);

        self.server.do_send(Connect { id: self.id, addr: ctx.address() });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("WebSocket session stopped: {}", self.id);

        self.server.do_send(Disconnect { id: self.id });
    }
}

/// Implement Message trait cho ClientMessage để có thể send qua actors
impl Message for ClientMessage {
    type Result = ();
}

/// Handler: Nhận ClientMessage từ handler.rs
impl Handler<ClientMessage> for WsChatSession {
    type Result = ();

    fn handle(&mut self, msg: ClientMessage, ctx: &mut Context<Self>) {
        self.handle_client_message(&msg, ctx);
    }
}

/// Handler: Nhận ServerMessage từ server actor → serialize → gửi client
impl Handler<ServerMessage> for WsChatSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, _ctx: &mut Context<Self>) {
        self.send_to_client(&msg);
    }
}
