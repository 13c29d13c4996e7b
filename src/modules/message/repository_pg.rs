use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        message::{model::InsertMessage, repository::MessageRepository, schema::MessageEntity},
        user::schema::UserRole,
    },
};

#[derive(Clone)]
pub struct MessageRepositoryPg {
    pool: sqlx::PgPool,
}

impl MessageRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MessageRepository for MessageRepositoryPg {
    async fn append(
        &self,
        message: &InsertMessage,
    ) -> Result<MessageEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // Row lock trên conversation linearize các append đồng thời;
        // seq là nguồn ordering duy nhất của log.
        let seq: Option<i64> = sqlx::query_scalar(
            "UPDATE conversations SET last_seq = last_seq + 1 WHERE id = $1 RETURNING last_seq",
        )
        .bind(message.conversation_id)
        .fetch_optional(tx.as_mut())
        .await?;

        let seq = seq.ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;

        let stored = sqlx::query_as::<_, MessageEntity>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_role, sender_id, receiver_id, body, seq)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(message.conversation_id)
        .bind(&message.sender_role)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.body)
        .bind(seq)
        .fetch_one(tx.as_mut())
        .await?;

        let unread_increment = if stored.sender_role == UserRole::User { 1i32 } else { 0 };

        sqlx::query(
            r#"
            UPDATE conversations
            SET last_body = $2,
                last_created_at = $3,
                unread_count = unread_count + $4,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(message.conversation_id)
        .bind(&stored.body)
        .bind(stored.created_at)
        .bind(unread_increment)
        .execute(tx.as_mut())
        .await?;

        tx.commit().await?;

        Ok(stored)
    }

    async fn history(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        // has index on (conversation_id, seq)
        let messages = sqlx::query_as::<_, MessageEntity>(
            "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY seq ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn mark_read(
        &self,
        conversation_id: &Uuid,
        reader_role: &UserRole,
    ) -> Result<u64, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            UPDATE messages
            SET read_at = NOW()
            WHERE conversation_id = $1 AND sender_role <> $2 AND read_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(reader_role)
        .execute(tx.as_mut())
        .await?
        .rows_affected();

        if *reader_role == UserRole::Admin {
            sqlx::query(
                "UPDATE conversations SET unread_count = 0, updated_at = NOW() WHERE id = $1",
            )
            .bind(conversation_id)
            .execute(tx.as_mut())
            .await?;
        }

        tx.commit().await?;

        Ok(rows)
    }
}
