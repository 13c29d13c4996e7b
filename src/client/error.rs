/// Taxonomy lỗi phía client.
///
/// `Auth` fatal cho connection attempt, không tự retry. `Network`/`Transport`
/// transient - connection tự retry với backoff, message thì retry thủ công.
/// `Rejected` cần người dùng sửa input, không bao giờ tự retry.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Session closed")]
    Closed,
    #[error("Invalid delivery state: {0}")]
    InvalidState(&'static str),
}
