/// Conversation Log (phía client)
///
/// Projection của log một conversation, rebuild được từ history fetch bất kỳ
/// lúc nào. Kênh live không replay event bị miss khi disconnect, nên sau
/// reconnect consumer re-fetch history rồi merge vào đây theo message id -
/// id do store cấp là authoritative, mỗi message xuất hiện đúng một lần.
use std::collections::HashSet;
use uuid::Uuid;

use crate::modules::message::schema::MessageEntity;

#[derive(Default)]
pub struct ConversationLog {
    messages: Vec<MessageEntity>,
    ids: HashSet<Uuid>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chèn một message, giữ thứ tự seq. Trả về false nếu id đã có
    /// (duplicate từ push event hoặc history chồng lấn).
    pub fn insert(&mut self, message: MessageEntity) -> bool {
        if !self.ids.insert(message.id) {
            return false;
        }

        let position = self
            .messages
            .iter()
            .position(|m| m.seq > message.seq)
            .unwrap_or(self.messages.len());
        self.messages.insert(position, message);
        true
    }

    /// Merge một lần history fetch: union theo id với những gì đã có.
    pub fn merge_history(&mut self, history: Vec<MessageEntity>) {
        for message in history {
            self.insert(message);
        }
    }

    /// Cập nhật read_at từ history mới (mark-read là mutation duy nhất
    /// trên message đã lưu).
    pub fn apply_read_state(&mut self, history: &[MessageEntity]) {
        for fresh in history {
            if let Some(existing) =
                self.messages.iter_mut().find(|m| m.id == fresh.id)
            {
                existing.read_at = fresh.read_at;
            }
        }
    }

    pub fn messages(&self) -> &[MessageEntity] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::sample_message;

    #[test]
    fn insert_keeps_seq_order_for_out_of_order_arrivals() {
        let mut log = ConversationLog::new();
        let m1 = sample_message("one", 1);
        let m2 = sample_message("two", 2);
        let m3 = sample_message("three", 3);

        log.insert(m3.clone());
        log.insert(m1.clone());
        log.insert(m2.clone());

        let seqs: Vec<i64> = log.messages().iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn reconnect_refetch_does_not_duplicate() {
        let mut log = ConversationLog::new();
        let m1 = sample_message("m1", 1);

        // m1 đã về qua push trước khi rớt mạng
        log.insert(m1.clone());

        // Sau reconnect: re-fetch history chứa m1 + m2
        let m2 = sample_message("m2", 2);
        log.merge_history(vec![m1.clone(), m2.clone()]);

        assert_eq!(log.len(), 2);
        assert_eq!(log.messages().iter().filter(|m| m.id == m1.id).count(), 1);
    }

    #[test]
    fn refetch_after_missed_push_shows_message_exactly_once() {
        // m1 được store nhận nhưng push không bao giờ tới client
        let mut log = ConversationLog::new();
        let m1 = sample_message("m1", 1);

        log.merge_history(vec![m1.clone()]);
        // fetch lại lần nữa (restartable) - vẫn đúng một bản
        log.merge_history(vec![m1.clone()]);

        assert_eq!(log.len(), 1);
    }

    #[test]
    fn apply_read_state_updates_existing_entries() {
        let mut log = ConversationLog::new();
        let mut m1 = sample_message("m1", 1);
        log.insert(m1.clone());
        assert!(log.messages()[0].read_at.is_none());

        m1.read_at = Some(chrono::Utc::now());
        log.apply_read_state(&[m1]);

        assert!(log.messages()[0].read_at.is_some());
    }
}
