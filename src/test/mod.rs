/// Shared test fixtures.
///
/// `InMemoryStore` implement cả ba repository traits trên cùng một state,
/// giữ đúng semantics của Postgres impl: seq counter per conversation,
/// unread tăng theo tin từ user, delete cascade sang messages. Services
/// generic qua traits nên test chạy thẳng trên store này, không cần DB.
use chrono::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::api::error;
use crate::modules::conversation::model::ConversationDirectoryRow;
use crate::modules::conversation::repository::ConversationRepository;
use crate::modules::conversation::schema::ConversationEntity;
use crate::modules::message::model::InsertMessage;
use crate::modules::message::repository::MessageRepository;
use crate::modules::message::schema::MessageEntity;
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::{UserEntity, UserRole};

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<Vec<UserEntity>>,
    conversations: Mutex<Vec<ConversationEntity>>,
    messages: Mutex<Vec<MessageEntity>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_user(&self, role: UserRole, display_name: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.users.lock().unwrap().push(UserEntity {
            id,
            display_name: display_name.to_string(),
            role,
            created_at: Utc::now(),
        });
        id
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// Truy cập trực tiếp (inherent) để tests khỏi đụng ambiguity giữa
    /// `UserRepository::find_by_id` và `ConversationRepository::find_by_id`.
    pub fn conversation(&self, id: &Uuid) -> Option<ConversationEntity> {
        self.conversations.lock().unwrap().iter().find(|c| c.id == *id).cloned()
    }

    pub fn conversation_for_user(&self, user_id: &Uuid) -> Option<ConversationEntity> {
        self.conversations.lock().unwrap().iter().find(|c| c.user_id == *user_id).cloned()
    }
}

/// Message fixture cho các test phía client (log, delivery, session).
pub fn sample_message(body: &str, seq: i64) -> MessageEntity {
    MessageEntity {
        id: Uuid::now_v7(),
        conversation_id: Uuid::now_v7(),
        sender_role: UserRole::User,
        sender_id: Uuid::now_v7(),
        receiver_id: Uuid::now_v7(),
        body: body.to_string(),
        seq,
        read_at: None,
        created_at: Utc::now(),
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned())
    }

    async fn find_support_admin(&self) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.role == UserRole::Admin)
            .cloned())
    }
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == *conversation_id)
            .cloned())
    }

    async fn find_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user_id == *user_id)
            .cloned())
    }

    async fn create(&self, user_id: &Uuid) -> Result<ConversationEntity, error::SystemError> {
        let mut conversations = self.conversations.lock().unwrap();

        // unique constraint trên user_id
        if conversations.iter().any(|c| c.user_id == *user_id) {
            return Err(error::SystemError::Conflict(None));
        }

        let now = Utc::now();
        let conversation = ConversationEntity {
            id: Uuid::now_v7(),
            user_id: *user_id,
            last_seq: 0,
            last_body: None,
            last_created_at: None,
            unread_count: 0,
            created_at: now,
            updated_at: now,
        };
        conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn list_directory(
        &self,
    ) -> Result<Vec<ConversationDirectoryRow>, error::SystemError> {
        let users = self.users.lock().unwrap();
        let conversations = self.conversations.lock().unwrap();

        let mut rows: Vec<ConversationDirectoryRow> = conversations
            .iter()
            .map(|c| ConversationDirectoryRow {
                id: c.id,
                user_id: c.user_id,
                user_display_name: users
                    .iter()
                    .find(|u| u.id == c.user_id)
                    .map(|u| u.display_name.clone())
                    .unwrap_or_default(),
                last_body: c.last_body.clone(),
                last_created_at: c.last_created_at,
                unread_count: c.unread_count,
            })
            .collect();

        let freshness = |row: &ConversationDirectoryRow| {
            row.last_created_at.unwrap_or_else(|| {
                conversations
                    .iter()
                    .find(|c| c.id == row.id)
                    .map(|c| c.created_at)
                    .unwrap_or_else(Utc::now)
            })
        };
        rows.sort_by(|a, b| freshness(b).cmp(&freshness(a)));

        Ok(rows)
    }

    async fn delete(&self, conversation_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut conversations = self.conversations.lock().unwrap();
        let before = conversations.len();
        conversations.retain(|c| c.id != *conversation_id);

        if conversations.len() == before {
            return Ok(false);
        }

        // cascade
        self.messages.lock().unwrap().retain(|m| m.conversation_id != *conversation_id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryStore {
    async fn append(
        &self,
        message: &InsertMessage,
    ) -> Result<MessageEntity, error::SystemError> {
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;

        let now = Utc::now();
        conversation.last_seq += 1;

        let stored = MessageEntity {
            id: Uuid::now_v7(),
            conversation_id: message.conversation_id,
            sender_role: message.sender_role.clone(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            body: message.body.clone(),
            seq: conversation.last_seq,
            read_at: None,
            created_at: now,
        };

        conversation.last_body = Some(stored.body.clone());
        conversation.last_created_at = Some(now);
        conversation.updated_at = now;
        if stored.sender_role == UserRole::User {
            conversation.unread_count += 1;
        }

        self.messages.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn history(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let mut messages: Vec<MessageEntity> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.seq);
        Ok(messages)
    }

    async fn mark_read(
        &self,
        conversation_id: &Uuid,
        reader_role: &UserRole,
    ) -> Result<u64, error::SystemError> {
        let mut conversations = self.conversations.lock().unwrap();
        let mut messages = self.messages.lock().unwrap();

        let now = Utc::now();
        let mut marked = 0u64;
        for message in messages
            .iter_mut()
            .filter(|m| m.conversation_id == *conversation_id)
            .filter(|m| m.sender_role != *reader_role && m.read_at.is_none())
        {
            message.read_at = Some(now);
            marked += 1;
        }

        if *reader_role == UserRole::Admin {
            if let Some(conversation) =
                conversations.iter_mut().find(|c| c.id == *conversation_id)
            {
                conversation.unread_count = 0;
                conversation.updated_at = now;
            }
        }

        Ok(marked)
    }
}
