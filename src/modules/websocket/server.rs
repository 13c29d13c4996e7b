/// Chat Server Actor
///
/// Actor trung tâm giữ map identity → sessions cho toàn bộ kênh live.
/// Sau khi store chấp nhận một message, server route nó tới user của thread
/// và tới mọi admin đang online (admin subscribe mọi thread; user chỉ
/// subscribe thread của chính mình). Không giữ state authoritative nào -
/// client luôn có thể rebuild từ history fetch.
use actix::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::modules::user::schema::UserRole;

use super::events::*;
use super::message::ServerMessage;
use super::session::WsChatSession;

pub struct ChatServer {
    /// Map: session_id -> session actor address
    sessions: HashMap<Uuid, Addr<WsChatSession>>,

    /// Map: identity -> set of session_ids
    /// Một identity có thể mở nhiều session (admin mở 2 tab chẳng hạn)
    identities: HashMap<Uuid, HashSet<Uuid>>,

    /// Role của từng identity đã join, quyết định routing
    roles: HashMap<Uuid, UserRole>,
}

impl ChatServer {
    pub fn new() -> Self {
        Self { sessions: HashMap::new(), identities: HashMap::new(), roles: HashMap::new() }
    }

    /// Gửi message tới một session cụ thể
    fn send_to_session(&self, session_id: &Uuid, message: ServerMessage) {
        if let Some(session_addr) = self.sessions.get(session_id) {
            session_addr.do_send(message);
        }
    }

    /// Gửi message tới tất cả sessions của một identity
    fn send_to_identity(&self, user_id: &Uuid, message: ServerMessage) {
        if let Some(session_ids) = self.identities.get(user_id) {
            for session_id in session_ids {
                self.send_to_session(session_id, message.clone());
            }
        }
    }
}

impl Actor for ChatServer {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Chat server started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Chat server stopped");
    }
}

/// Handler: Session mới connected
impl Handler<Connect> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        tracing::debug!("New chat session connected: {}", msg.id);

        self.sessions.insert(msg.id, msg.addr);
    }
}

/// Handler: Session disconnected
impl Handler<Disconnect> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        tracing::debug!("Chat session disconnected: {}", msg.id);

        self.sessions.remove(&msg.id);

        // Tìm identity có session này và gỡ session khỏi set
        let mut identity_to_remove: Option<Uuid> = None;
        for (&user_id, sessions) in self.identities.iter_mut() {
            if sessions.remove(&msg.id) {
                if sessions.is_empty() {
                    identity_to_remove = Some(user_id);
                }
                break;
            }
        }

        if let Some(user_id) = identity_to_remove {
            self.identities.remove(&user_id);
            self.roles.remove(&user_id);
            tracing::info!("Identity {} fully disconnected (no more sessions)", user_id);
        }
    }
}

/// Handler: Session hoàn thành join handshake
impl Handler<Join> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Join, _: &mut Context<Self>) {
        let sessions = self.identities.entry(msg.user_id).or_default();
        sessions.insert(msg.session_id);
        self.roles.insert(msg.user_id, msg.role);

        tracing::info!(
            "Identity {} joined trên session {} ({} active session(s))",
            msg.user_id,
            msg.session_id,
            sessions.len()
        );
    }
}

/// Handler: Route message tới user của thread + toàn bộ admins
impl Handler<RouteMessage> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: RouteMessage, _: &mut Context<Self>) {
        let mut targets: HashSet<Uuid> = self
            .roles
            .iter()
            .filter(|(_, role)| **role == UserRole::Admin)
            .map(|(id, _)| *id)
            .collect();
        targets.insert(msg.conversation_user_id);

        if let Some(skip) = msg.skip_identity {
            targets.remove(&skip);
        }

        let mut sent_count = 0;
        for identity in &targets {
            if let Some(session_ids) = self.identities.get(identity) {
                sent_count += session_ids.len();
            }
            self.send_to_identity(
                identity,
                ServerMessage::NewMessage { message: msg.message.clone() },
            );
        }

        tracing::debug!(
            "Routed message {} tới {} sessions",
            msg.message.id,
            sent_count
        );
    }
}

/// Implement Message trait cho ServerMessage để có thể send tới sessions
impl Message for ServerMessage {
    type Result = ();
}

impl Default for ChatServer {
    fn default() -> Self {
        Self::new()
    }
}
