use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{model::ConversationDirectoryRow, schema::ConversationEntity},
};

#[async_trait::async_trait]
pub trait ConversationRepository {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    async fn find_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    /// Tạo thread mới cho user. Unique constraint trên `user_id` chặn
    /// trường hợp 2 request cùng tạo; caller xử lý Conflict bằng cách đọc lại.
    async fn create(&self, user_id: &Uuid) -> Result<ConversationEntity, error::SystemError>;

    /// Toàn bộ conversation kèm display name của user, mới nhất trước.
    /// Đọc thẳng từ store - không có cache để mà stale.
    async fn list_directory(&self)
        -> Result<Vec<ConversationDirectoryRow>, error::SystemError>;

    /// Xóa conversation và toàn bộ messages (FK cascade).
    /// Trả về false nếu id không tồn tại (đã xóa trước đó).
    async fn delete(&self, conversation_id: &Uuid) -> Result<bool, error::SystemError>;
}
