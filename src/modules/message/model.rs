use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::modules::user::schema::UserRole;

#[derive(Debug, Clone)]
pub struct InsertMessage {
    pub conversation_id: Uuid,
    pub sender_role: UserRole,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// User id của thread đích. Bắt buộc khi admin gửi; user client bỏ qua.
    pub target_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Message body must not be empty"))]
    pub body: String,
}
