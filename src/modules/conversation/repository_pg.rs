use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{
        model::ConversationDirectoryRow, repository::ConversationRepository,
        schema::ConversationEntity,
    },
};

#[derive(Clone)]
pub struct ConversationRepositoryPg {
    pool: sqlx::PgPool,
}

impl ConversationRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for ConversationRepositoryPg {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation =
            sqlx::query_as::<_, ConversationEntity>("SELECT * FROM conversations WHERE id = $1")
                .bind(conversation_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(conversation)
    }

    async fn find_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation = sqlx::query_as::<_, ConversationEntity>(
            "SELECT * FROM conversations WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn create(&self, user_id: &Uuid) -> Result<ConversationEntity, error::SystemError> {
        let id = Uuid::now_v7();
        let conversation = sqlx::query_as::<_, ConversationEntity>(
            "INSERT INTO conversations (id, user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn list_directory(
        &self,
    ) -> Result<Vec<ConversationDirectoryRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, ConversationDirectoryRow>(
            r#"
            SELECT
                c.id,
                c.user_id,
                u.display_name AS user_display_name,
                c.last_body,
                c.last_created_at,
                c.unread_count
            FROM conversations c
            JOIN users u ON u.id = c.user_id
            ORDER BY COALESCE(c.last_created_at, c.created_at) DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete(&self, conversation_id: &Uuid) -> Result<bool, error::SystemError> {
        // messages đi theo qua ON DELETE CASCADE
        let rows = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}
