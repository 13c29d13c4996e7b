/// Conversation Directory Service
///
/// Danh sách conversation phía admin: mỗi dòng mang preview của tin nhắn
/// cuối và unread count đọc thẳng từ store, cộng thao tác xóa conversation.
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{model::ConversationSummary, repository::ConversationRepository},
};

#[derive(Clone)]
pub struct ConversationService<C>
where
    C: ConversationRepository + Send + Sync + 'static,
{
    conversation_repo: Arc<C>,
}

impl<C> ConversationService<C>
where
    C: ConversationRepository + Send + Sync + 'static,
{
    pub fn with_dependencies(conversation_repo: Arc<C>) -> Self {
        ConversationService { conversation_repo }
    }

    pub async fn list_conversations(
        &self,
    ) -> Result<Vec<ConversationSummary>, error::SystemError> {
        let rows = self.conversation_repo.list_directory().await?;

        Ok(rows.into_iter().map(ConversationSummary::from).collect())
    }

    /// Xóa là one-shot: lần gọi thứ hai trả NotFound thay vì thành công
    /// idempotent, vì identity của conversation không thể tạo lại.
    pub async fn delete_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let deleted = self.conversation_repo.delete(&conversation_id).await?;

        if !deleted {
            return Err(error::SystemError::not_found("Conversation not found"));
        }

        tracing::info!("Conversation {} deleted cùng toàn bộ messages", conversation_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::message::service::MessageService;
    use crate::modules::user::schema::UserRole;
    use crate::test::InMemoryStore;
    use std::sync::Arc;

    type ConvSvc = ConversationService<InMemoryStore>;
    type MsgSvc = MessageService<InMemoryStore, InMemoryStore, InMemoryStore>;

    fn services(store: &Arc<InMemoryStore>) -> (ConvSvc, MsgSvc) {
        (
            ConversationService::with_dependencies(store.clone()),
            MessageService::with_dependencies(store.clone(), store.clone(), store.clone(), None),
        )
    }

    #[tokio::test]
    async fn directory_reflects_preview_and_unread() {
        let store = InMemoryStore::new();
        let admin = store.seed_user(UserRole::Admin, "Support");
        let user = store.seed_user(UserRole::User, "Khách A");
        let (conv_svc, msg_svc) = services(&store);
        let _ = admin;

        msg_svc.send(user, UserRole::User, None, "Xe này còn không?".into()).await.unwrap();
        msg_svc.send(user, UserRole::User, None, "Alo?".into()).await.unwrap();

        let directory = conv_svc.list_conversations().await.unwrap();
        assert_eq!(directory.len(), 1);

        let entry = &directory[0];
        assert_eq!(entry.user_id, user);
        assert_eq!(entry.unread_count, 2);
        assert_eq!(entry.preview.as_ref().unwrap().body, "Alo?");
    }

    #[tokio::test]
    async fn directory_orders_newest_first() {
        let store = InMemoryStore::new();
        store.seed_user(UserRole::Admin, "Support");
        let user_a = store.seed_user(UserRole::User, "A");
        let user_b = store.seed_user(UserRole::User, "B");
        let (conv_svc, msg_svc) = services(&store);

        msg_svc.send(user_a, UserRole::User, None, "first".into()).await.unwrap();
        msg_svc.send(user_b, UserRole::User, None, "second".into()).await.unwrap();

        let directory = conv_svc.list_conversations().await.unwrap();
        assert_eq!(directory[0].user_id, user_b);
        assert_eq!(directory[1].user_id, user_a);
    }

    #[tokio::test]
    async fn delete_is_one_shot_not_idempotent() {
        let store = InMemoryStore::new();
        store.seed_user(UserRole::Admin, "Support");
        let user = store.seed_user(UserRole::User, "Khách");
        let (conv_svc, msg_svc) = services(&store);

        let message =
            msg_svc.send(user, UserRole::User, None, "hello".into()).await.unwrap();

        conv_svc.delete_conversation(message.conversation_id).await.unwrap();

        let second = conv_svc.delete_conversation(message.conversation_id).await;
        assert!(matches!(second, Err(error::SystemError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_messages_with_conversation() {
        let store = InMemoryStore::new();
        store.seed_user(UserRole::Admin, "Support");
        let user = store.seed_user(UserRole::User, "Khách");
        let (conv_svc, msg_svc) = services(&store);

        let message = msg_svc.send(user, UserRole::User, None, "hello".into()).await.unwrap();
        assert_eq!(store.message_count(), 1);

        conv_svc.delete_conversation(message.conversation_id).await.unwrap();
        assert_eq!(store.message_count(), 0);
        assert!(conv_svc.list_conversations().await.unwrap().is_empty());
    }

    /// Vòng đời đầy đủ của một thread hỗ trợ: user mở thread, admin đọc,
    /// trả lời rồi xóa.
    #[tokio::test]
    async fn support_thread_lifecycle() {
        let store = InMemoryStore::new();
        let admin = store.seed_user(UserRole::Admin, "Support");
        let user = store.seed_user(UserRole::User, "Khách");
        let (conv_svc, msg_svc) = services(&store);

        // User gửi tin đầu tiên → conversation tạo implicit, unread = 1
        let m1 = msg_svc.send(user, UserRole::User, None, "Hello".into()).await.unwrap();
        let c1 = m1.conversation_id;

        let directory = conv_svc.list_conversations().await.unwrap();
        assert_eq!(directory[0].unread_count, 1);

        // Admin đọc history
        let history = msg_svc.history_for_conversation(c1).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, m1.id);

        // Admin mark read → unread = 0, read_at được set
        msg_svc.mark_read_for_conversation(c1, UserRole::Admin).await.unwrap();
        let directory = conv_svc.list_conversations().await.unwrap();
        assert_eq!(directory[0].unread_count, 0);
        let history = msg_svc.history_for_conversation(c1).await.unwrap();
        assert!(history[0].read_at.is_some());

        // Admin trả lời → xếp sau m1
        let m2 = msg_svc
            .send(admin, UserRole::Admin, Some(user), "Hi, how can I help?".into())
            .await
            .unwrap();
        let history = msg_svc.history_for_conversation(c1).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, m1.id);
        assert_eq!(history[1].id, m2.id);
        assert!(history[0].seq < history[1].seq);

        // Xóa → biến mất khỏi directory, history trả NotFound
        conv_svc.delete_conversation(c1).await.unwrap();
        assert!(conv_svc.list_conversations().await.unwrap().is_empty());
        let gone = msg_svc.history_for_conversation(c1).await;
        assert!(matches!(gone, Err(error::SystemError::NotFound(_))));
    }
}
