use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Một thread 1:1 giữa đúng một user (khách) và admin pool.
/// `user_id` là bất biến sau khi tạo; mỗi user có tối đa một conversation.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Sequence counter cấp số thứ tự cho message (nguồn ordering duy nhất).
    pub last_seq: i64,
    pub last_body: Option<String>,
    pub last_created_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Số message từ user mà admin chưa đọc.
    pub unread_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
