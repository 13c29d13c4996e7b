/// Message Service
///
/// Business logic cho message store:
/// - Gửi tin nhắn (user → admin pool, admin → user) qua cả hai entry point
///   (HTTP và WebSocket) với cùng một invariant
/// - History theo conversation hoặc theo user
/// - Mark read (idempotent)
/// - Broadcast real-time qua WebSocket server actor
use actix::Addr;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::conversation::repository::ConversationRepository;
use crate::modules::conversation::schema::ConversationEntity;
use crate::modules::message::model::InsertMessage;
use crate::modules::message::repository::MessageRepository;
use crate::modules::message::schema::MessageEntity;
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::UserRole;
use crate::modules::websocket::events::RouteMessage;
use crate::modules::websocket::server::ChatServer;

/// Service với generic repositories để dễ testing.
/// `ws_server` là None trong test environment.
#[derive(Clone)]
pub struct MessageService<M, C, U>
where
    M: MessageRepository + Send + Sync,
    C: ConversationRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    message_repo: Arc<M>,
    conversation_repo: Arc<C>,
    user_repo: Arc<U>,
    ws_server: Option<Arc<Addr<ChatServer>>>,
}

impl<M, C, U> MessageService<M, C, U>
where
    M: MessageRepository + Send + Sync,
    C: ConversationRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(
        message_repo: Arc<M>,
        conversation_repo: Arc<C>,
        user_repo: Arc<U>,
        ws_server: Option<Arc<Addr<ChatServer>>>,
    ) -> Self {
        MessageService { message_repo, conversation_repo, user_repo, ws_server }
    }

    /// Gửi tin nhắn. Cả POST /messages lẫn WebSocket `send` đều đi qua đây.
    ///
    /// Flow:
    /// 1. Validate body không rỗng
    /// 2. Resolve conversation + receiver theo role của sender
    ///    (tạo implicit nếu chưa có - kể cả khi admin mở thread trước)
    /// 3. Append vào store (store cấp id + seq + timestamp)
    /// 4. Broadcast tới user của thread và toàn bộ admin đang online
    pub async fn send(
        &self,
        sender_id: Uuid,
        sender_role: UserRole,
        target_id: Option<Uuid>,
        body: String,
    ) -> Result<MessageEntity, error::SystemError> {
        if body.trim().is_empty() {
            return Err(error::SystemError::bad_request("Message body must not be empty"));
        }

        let (conversation, receiver_id) = match sender_role {
            UserRole::User => {
                let admin = self
                    .user_repo
                    .find_support_admin()
                    .await?
                    .ok_or_else(|| error::SystemError::not_found("No support agent available"))?;

                let conversation = self.find_or_create_conversation(&sender_id).await?;
                (conversation, admin.id)
            }

            UserRole::Admin => {
                let target = target_id.ok_or_else(|| {
                    error::SystemError::bad_request(
                        "targetId is required when an agent sends a message",
                    )
                })?;

                let user = self
                    .user_repo
                    .find_by_id(&target)
                    .await?
                    .filter(|u| u.role == UserRole::User)
                    .ok_or_else(|| error::SystemError::not_found("Recipient not found"))?;

                let conversation = self.find_or_create_conversation(&user.id).await?;
                (conversation, user.id)
            }
        };

        let message = self
            .message_repo
            .append(&InsertMessage {
                conversation_id: conversation.id,
                sender_role,
                sender_id,
                receiver_id,
                body,
            })
            .await?;

        if let Some(server) = &self.ws_server {
            server.do_send(RouteMessage {
                conversation_user_id: conversation.user_id,
                message: message.clone(),
                skip_identity: Some(sender_id),
            });

            tracing::info!(
                "Message {} saved và route tới conversation {}",
                message.id,
                conversation.id
            );
        }

        Ok(message)
    }

    /// History của một conversation cụ thể (phía admin).
    pub async fn history_for_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        self.conversation_repo
            .find_by_id(&conversation_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;

        self.message_repo.history(&conversation_id).await
    }

    /// History của chính user (widget phía storefront). User chưa từng nhắn
    /// thì chưa có thread - trả list rỗng, không phải lỗi.
    pub async fn history_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        match self.conversation_repo.find_by_user(&user_id).await? {
            Some(conversation) => self.message_repo.history(&conversation.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn mark_read_for_conversation(
        &self,
        conversation_id: Uuid,
        reader_role: UserRole,
    ) -> Result<(), error::SystemError> {
        self.conversation_repo
            .find_by_id(&conversation_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;

        let marked = self.message_repo.mark_read(&conversation_id, &reader_role).await?;
        tracing::debug!("Marked {} messages read trong conversation {}", marked, conversation_id);

        Ok(())
    }

    /// Mark read phía user: resolve thread của chính user. Chưa có thread
    /// thì không có gì để đọc - no-op (idempotent).
    pub async fn mark_read_for_user(&self, user_id: Uuid) -> Result<(), error::SystemError> {
        if let Some(conversation) = self.conversation_repo.find_by_user(&user_id).await? {
            self.message_repo.mark_read(&conversation.id, &UserRole::User).await?;
        }

        Ok(())
    }

    async fn find_or_create_conversation(
        &self,
        user_id: &Uuid,
    ) -> Result<ConversationEntity, error::SystemError> {
        if let Some(conversation) = self.conversation_repo.find_by_user(user_id).await? {
            return Ok(conversation);
        }

        match self.conversation_repo.create(user_id).await {
            Ok(conversation) => Ok(conversation),
            // Race: request khác vừa tạo thread cho user này → đọc lại
            Err(e) if e.is_conflict() => self
                .conversation_repo
                .find_by_user(user_id)
                .await?
                .ok_or_else(|| error::SystemError::not_found("Conversation not found")),
            Err(e) => Err(e),
        }
    }
}
