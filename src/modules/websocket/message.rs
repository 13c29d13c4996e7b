/// WebSocket Message Protocol
///
/// Các message types trao đổi giữa client và server trên kênh live.
/// Server chỉ nhận traffic sau khi session hoàn thành `join` handshake.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::{message::schema::MessageEntity, user::schema::UserRole};

/// Messages được gửi từ client đến server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Handshake: xác thực session với access token, map identity → channel
    #[serde(rename_all = "camelCase")]
    Join { token: String },

    /// Gửi tin nhắn. `target_id` là user id của thread đích (admin gửi);
    /// user client bỏ qua vì thread của họ là implicit.
    #[serde(rename_all = "camelCase")]
    Send { target_id: Option<Uuid>, body: String },

    /// Ping để giữ connection alive
    Ping,
}

/// Messages được gửi từ server đến client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Join handshake thành công
    #[serde(rename_all = "camelCase")]
    Connected { user_id: Uuid, role: UserRole },

    /// Tin nhắn mới trong thread liên quan đến client này
    #[serde(rename_all = "camelCase")]
    NewMessage { message: MessageEntity },

    /// Lỗi trên kênh live (auth thất bại, send bị từ chối, ...)
    #[serde(rename_all = "camelCase")]
    ConnectionError { reason: String },

    /// Pong response cho Ping
    Pong,
}
