use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        message::{model::InsertMessage, schema::MessageEntity},
        user::schema::UserRole,
    },
};

#[async_trait::async_trait]
pub trait MessageRepository {
    /// Append vào log của conversation: cấp id + seq + timestamp phía server.
    /// Các append cùng conversation được linearize bởi sequence counter.
    /// NotFound nếu conversation không tồn tại.
    async fn append(&self, message: &InsertMessage)
        -> Result<MessageEntity, error::SystemError>;

    /// Toàn bộ messages theo thứ tự seq tăng dần. Hữu hạn, re-fetch an toàn,
    /// phản ánh mọi mutation mark-read trước đó.
    async fn history(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError>;

    /// Set `read_at` cho mọi message chưa đọc gửi bởi role *kia*; nếu reader
    /// là admin thì reset unread_count của conversation về 0. Idempotent.
    /// Trả về số message vừa được đánh dấu.
    async fn mark_read(
        &self,
        conversation_id: &Uuid,
        reader_role: &UserRole,
    ) -> Result<u64, error::SystemError>;
}
