use uuid::Uuid;

use crate::{api::error, modules::user::schema::UserEntity};

/// Tra cứu identity chỉ-đọc. Đăng ký / đăng nhập thuộc về hệ thống auth
/// bên ngoài; chat core chỉ cần resolve id và tìm support agent.
#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    /// Admin nhận tin nhắn mở thread từ phía user (receiver mặc định).
    async fn find_support_admin(&self) -> Result<Option<UserEntity>, error::SystemError>;
}
