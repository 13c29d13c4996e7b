/// Admin Multiplexer
///
/// Admin mở N thread trong directory nhưng chỉ focus một thread trên UI.
/// Mọi inbound event đều cập nhật aggregate (preview + unread) của directory;
/// chỉ event khớp thread đang focus mới được append vào log hiển thị.
/// Matching rule: message thuộc thread C khi `sender_id == C.user_id`
/// hoặc `receiver_id == C.user_id`.
use std::collections::HashMap;
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::client::log::ConversationLog;
use crate::modules::conversation::model::{ConversationSummary, LastMessagePreview};
use crate::modules::message::schema::MessageEntity;
use crate::modules::user::schema::UserRole;

#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    /// Rỗng cho thread mới phát hiện qua push - được điền ở lần refresh
    /// directory kế tiếp
    pub user_display_name: String,
    pub preview: Option<LastMessagePreview>,
    pub unread_count: i32,
}

impl From<ConversationSummary> for DirectoryEntry {
    fn from(summary: ConversationSummary) -> Self {
        DirectoryEntry {
            conversation_id: summary.conversation_id,
            user_id: summary.user_id,
            user_display_name: summary.user_display_name,
            preview: summary.preview,
            unread_count: summary.unread_count,
        }
    }
}

/// Kết quả route một inbound event, tiện cho caller (và tests) quan sát.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Chỉ aggregate của directory được cập nhật
    DirectoryOnly,
    /// Aggregate cập nhật + message được append vào log đang focus
    AppendedToFocused,
}

#[derive(Default)]
pub struct AdminMultiplexer {
    directory: HashMap<Uuid, DirectoryEntry>,
    focused: Option<Uuid>,
    focused_log: ConversationLog,
}

impl AdminMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nạp (lại) directory từ listConversations - projection rebuild được
    /// bất kỳ lúc nào.
    pub fn load_directory(&mut self, summaries: Vec<ConversationSummary>) {
        self.directory =
            summaries.into_iter().map(|s| (s.conversation_id, DirectoryEntry::from(s))).collect();

        // Thread đang focus đã biến mất phía server → clear view
        if let Some(focused) = self.focused {
            if !self.directory.contains_key(&focused) {
                self.clear_focus();
            }
        }
    }

    /// Danh sách directory, thread có tin mới nhất đứng trước.
    pub fn entries(&self) -> Vec<&DirectoryEntry> {
        let mut entries: Vec<&DirectoryEntry> = self.directory.values().collect();
        entries.sort_by(|a, b| {
            let a_at = a.preview.as_ref().map(|p| p.created_at);
            let b_at = b.preview.as_ref().map(|p| p.created_at);
            b_at.cmp(&a_at)
        });
        entries
    }

    pub fn focus(&mut self, conversation_id: Uuid) -> Result<(), ClientError> {
        if !self.directory.contains_key(&conversation_id) {
            return Err(ClientError::NotFound("conversation not in directory".to_string()));
        }

        self.focused = Some(conversation_id);
        self.focused_log.clear();
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
        self.focused_log.clear();
    }

    pub fn focused(&self) -> Option<Uuid> {
        self.focused
    }

    pub fn focused_messages(&self) -> &[MessageEntity] {
        self.focused_log.messages()
    }

    /// Nạp history (sau focus hoặc sau reconnect) vào log đang focus,
    /// merge theo message id.
    pub fn apply_history(&mut self, history: Vec<MessageEntity>) {
        self.focused_log.merge_history(history);
    }

    /// Route một inbound event: aggregate luôn cập nhật, log chỉ nhận
    /// message khớp thread đang focus. Không focus thread nào thì chỉ
    /// có aggregate thay đổi.
    pub fn handle_inbound(&mut self, message: &MessageEntity) -> InboundOutcome {
        let thread_user_id = match message.sender_role {
            UserRole::User => message.sender_id,
            UserRole::Admin => message.receiver_id,
        };

        let entry =
            self.directory.entry(message.conversation_id).or_insert_with(|| DirectoryEntry {
                conversation_id: message.conversation_id,
                user_id: thread_user_id,
                user_display_name: String::new(),
                preview: None,
                unread_count: 0,
            });

        entry.preview = Some(LastMessagePreview {
            body: message.body.clone(),
            created_at: message.created_at,
        });
        if message.sender_role == UserRole::User {
            entry.unread_count += 1;
        }

        let matches_focused = self
            .focused
            .and_then(|id| self.directory.get(&id))
            .map(|focused| {
                message.sender_id == focused.user_id || message.receiver_id == focused.user_id
            })
            .unwrap_or(false);

        if matches_focused {
            self.focused_log.insert(message.clone());
            InboundOutcome::AppendedToFocused
        } else {
            InboundOutcome::DirectoryOnly
        }
    }

    /// Áp dụng một deletion đã thành công phía server. Nếu thread bị xóa
    /// đang focus thì view được clear - hiệu ứng quan sát được của deletion.
    pub fn apply_deletion(&mut self, conversation_id: Uuid) -> bool {
        let removed = self.directory.remove(&conversation_id).is_some();

        if self.focused == Some(conversation_id) {
            self.clear_focus();
        }

        removed
    }

    /// Sau khi markRead thành công phía server.
    pub fn apply_mark_read(&mut self, conversation_id: Uuid) {
        if let Some(entry) = self.directory.get_mut(&conversation_id) {
            entry.unread_count = 0;
        }
    }
}
