/// Session Events & Dispatch Table
///
/// Thay cho kiểu đăng ký callback rải rác mutate thẳng UI state: một dispatch
/// table tường minh theo event kind, mỗi kind tối đa một handler. Handler
/// chạy tuần tự trên receive loop theo đúng thứ tự event về.
use std::collections::HashMap;
use uuid::Uuid;

use crate::modules::{message::schema::MessageEntity, user::schema::UserRole};

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Kênh live đã sẵn sàng (sau join handshake, kể cả sau reconnect)
    Connected { user_id: Uuid, role: UserRole },
    /// Tin nhắn mới được push từ server
    Message(MessageEntity),
    /// Lỗi trên kênh live; sau khi hết số lần reconnect đây là trạng thái
    /// lỗi persistent
    ConnectionError { reason: String },
    /// Transport rớt; SDK sẽ tự reconnect, consumer nên re-fetch history
    /// khi thấy Connected tiếp theo
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Message,
    ConnectionError,
    Disconnected,
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::Connected { .. } => EventKind::Connected,
            SessionEvent::Message(_) => EventKind::Message,
            SessionEvent::ConnectionError { .. } => EventKind::ConnectionError,
            SessionEvent::Disconnected => EventKind::Disconnected,
        }
    }
}

pub type EventHandler = Box<dyn FnMut(&SessionEvent) + Send>;

#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<EventKind, EventHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Đăng ký handler cho một event kind. Đăng ký lần nữa thì thay handler
    /// cũ (tối đa một handler mỗi kind). Trả về true nếu có handler bị thay.
    pub fn register(&mut self, kind: EventKind, handler: EventHandler) -> bool {
        self.handlers.insert(kind, handler).is_some()
    }

    pub fn dispatch(&mut self, event: &SessionEvent) {
        if let Some(handler) = self.handlers.get_mut(&event.kind()) {
            handler(event);
        }
    }
}
