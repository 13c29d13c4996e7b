/// Chat Client SDK
///
/// Phía consumer của support chat (widget storefront + console admin):
///
/// - Session manager: kênh live persistent với join handshake, dispatch
///   table theo event kind, reconnect backoff và close deterministic
/// - Delivery state machine: vòng đời một tin nhắn outbound từ Composing
///   tới Sent/Failed, pending message tách hẳn id space với message đã lưu
/// - Conversation log: merge history theo message id (reconcile sau reconnect)
/// - Admin multiplexer: N thread mở, một thread focus
/// - REST api: các thao tác request/response độc lập với kênh live
///
/// Mọi state ở đây chỉ là projection - nguồn sự thật duy nhất là message
/// store phía server, client luôn rebuild được bằng một lần fetch history.
pub mod delivery;
pub mod error;
pub mod event;
pub mod log;
pub mod multiplexer;
pub mod rest;
pub mod session;
pub mod transport;

pub use delivery::{DeliveryState, Outbox, PendingMessage, SendFailure};
pub use error::ClientError;
pub use event::{Dispatcher, EventKind, SessionEvent};
pub use log::ConversationLog;
pub use multiplexer::AdminMultiplexer;
pub use rest::{ApiConfig, ChatApi};
pub use session::{ChatSession, SessionConfig};
