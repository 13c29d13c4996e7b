use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ConversationDirectoryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_display_name: String,
    pub last_body: Option<String>,
    pub last_created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub unread_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessagePreview {
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Một dòng trong danh sách conversation phía admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub user_display_name: String,
    pub preview: Option<LastMessagePreview>,
    pub unread_count: i32,
}

impl From<ConversationDirectoryRow> for ConversationSummary {
    fn from(row: ConversationDirectoryRow) -> Self {
        let preview = match (row.last_body, row.last_created_at) {
            (Some(body), Some(created_at)) => Some(LastMessagePreview { body, created_at }),
            _ => None,
        };

        ConversationSummary {
            conversation_id: row.id,
            user_id: row.user_id,
            user_display_name: row.user_display_name,
            preview,
            unread_count: row.unread_count,
        }
    }
}
