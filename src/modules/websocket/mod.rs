/// WebSocket Module
///
/// Kênh live cho support chat: user nhận tin nhắn từ agent, admin nhận tin
/// từ mọi thread đang mở. Bao gồm:
///
/// - Message protocol (ClientMessage & ServerMessage)
/// - Chat Server actor (map identity → sessions, route theo thread)
/// - Session actor (join handshake + xử lý từng connection)
/// - HTTP handler (upgrade HTTP thành WebSocket)
pub mod events;
pub mod handler;
pub mod message;
pub mod server;
pub mod session;
