/// WebSocket Actor Events
///
/// Các messages trao đổi giữa Session actors và Chat Server actor.
use actix::prelude::*;
use uuid::Uuid;

use crate::modules::message::schema::MessageEntity;
use crate::modules::user::schema::UserRole;

use super::session::WsChatSession;

/// Event: Session mới connect tới server
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    /// Unique session ID
    pub id: Uuid,
    /// Address của session actor để có thể gửi messages
    pub addr: Addr<WsChatSession>,
}

/// Event: Session disconnect khỏi server
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    /// Session ID cần disconnect
    pub id: Uuid,
}

/// Event: Session hoàn thành join handshake với identity đã verify
#[derive(Message)]
#[rtype(result = "()")]
pub struct Join {
    /// Session ID vừa join
    pub session_id: Uuid,
    /// Identity sau khi verify token
    pub user_id: Uuid,
    /// Role quyết định subscription: admin nhận mọi thread,
    /// user chỉ nhận thread của mình
    pub role: UserRole,
}

/// Event: Route một message vừa được store chấp nhận tới các bên liên quan
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct RouteMessage {
    /// User (khách) của thread chứa message
    pub conversation_user_id: Uuid,
    /// Message đã persist (id + seq do store cấp)
    pub message: MessageEntity,
    /// Optional: không gửi lại cho identity này (thường là sender)
    pub skip_identity: Option<Uuid>,
}
