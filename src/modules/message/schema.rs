use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::modules::user::schema::UserRole;

/// Message bất biến sau khi store chấp nhận; chỉ `read_at` được mutate
/// (qua thao tác mark-read).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEntity {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_role: UserRole,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: String,
    /// Vị trí trong conversation, cấp bởi sequence counter của store.
    pub seq: i64,
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
