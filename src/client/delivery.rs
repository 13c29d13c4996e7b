/// Delivery State Machine
///
/// Vòng đời một tin nhắn outbound:
///
/// ```text
/// Composing --(submit)--> Sending --(ack từ store)--> Sent
///                                \--(lỗi)--> Failed
/// Sent --(peer đọc)--> Read   [chỉ mang tính thông tin]
/// Failed --(user retry)--> Sending
/// ```
///
/// Pending message sống hoàn toàn phía client với `local_id` riêng, không
/// bao giờ chung id space với message đã lưu. Khi store ack, pending bị
/// *thay thế* bởi stored message (join qua quan hệ resolved-by một chiều) -
/// không phải đổi nhãn - nên push event cho cùng nội dung không thể gây
/// trùng id.
use async_trait::async_trait;
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::client::log::ConversationLog;
use crate::modules::message::schema::MessageEntity;

/// Phân loại lỗi gửi: Transport được phép retry thủ công,
/// Rejected đòi hỏi user sửa input trước.
#[derive(Debug, Clone, PartialEq)]
pub enum SendFailure {
    Transport(String),
    Rejected(String),
}

impl SendFailure {
    pub fn retryable(&self) -> bool {
        matches!(self, SendFailure::Transport(_))
    }

    pub fn from_error(error: &ClientError) -> Self {
        match error {
            ClientError::Network(msg) | ClientError::Transport(msg) => {
                SendFailure::Transport(msg.clone())
            }
            ClientError::Closed => SendFailure::Transport("session closed".to_string()),
            ClientError::Rejected(msg)
            | ClientError::NotFound(msg)
            | ClientError::Auth(msg) => SendFailure::Rejected(msg.clone()),
            ClientError::InvalidState(msg) => SendFailure::Rejected((*msg).to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryState {
    Composing,
    Sending,
    /// Store đã cấp id durable - chỉ tồn tại trên stored message,
    /// pending entry đã bị thay thế tại thời điểm này
    Sent,
    Failed(SendFailure),
    /// Peer đã đọc (read_at đã set) - terminal, chỉ mang tính thông tin
    Read,
}

/// Tin nhắn outbound chưa được store ack. `local_id` không bao giờ persist.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub local_id: Uuid,
    pub target_id: Option<Uuid>,
    pub body: String,
    pub state: DeliveryState,
}

/// Outbox giữ các pending messages của một client.
/// Lỗi gửi không bao giờ bị nuốt: message Failed ở lại với failure kind
/// của nó cho tới khi user retry hoặc abandon.
#[derive(Default)]
pub struct Outbox {
    pending: Vec<PendingMessage>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compose(&mut self, target_id: Option<Uuid>, body: impl Into<String>) -> Uuid {
        let local_id = Uuid::now_v7();
        self.pending.push(PendingMessage {
            local_id,
            target_id,
            body: body.into(),
            state: DeliveryState::Composing,
        });
        local_id
    }

    /// Composing | Failed → Sending. Submit lần nữa khi đang Sending bị
    /// từ chối - không bao giờ lặng lẽ gửi đúp.
    pub fn submit(&mut self, local_id: &Uuid) -> Result<&PendingMessage, ClientError> {
        let pending = self
            .pending
            .iter_mut()
            .find(|p| p.local_id == *local_id)
            .ok_or_else(|| ClientError::NotFound("pending message not found".to_string()))?;

        match pending.state {
            DeliveryState::Composing | DeliveryState::Failed(_) => {
                pending.state = DeliveryState::Sending;
                Ok(pending)
            }
            DeliveryState::Sending => {
                Err(ClientError::InvalidState("message is already being sent"))
            }
            DeliveryState::Sent | DeliveryState::Read => {
                Err(ClientError::InvalidState("message was already delivered"))
            }
        }
    }

    /// Store đã ack: gỡ pending ra khỏi outbox. Caller chèn stored message
    /// vào log - thay thế theo id, không đổi nhãn.
    pub fn resolve(&mut self, local_id: &Uuid) -> Result<PendingMessage, ClientError> {
        let index = self
            .pending
            .iter()
            .position(|p| p.local_id == *local_id)
            .ok_or_else(|| ClientError::NotFound("pending message not found".to_string()))?;

        if self.pending[index].state != DeliveryState::Sending {
            return Err(ClientError::InvalidState("only a sending message can resolve"));
        }

        Ok(self.pending.remove(index))
    }

    pub fn fail(&mut self, local_id: &Uuid, failure: SendFailure) -> Result<(), ClientError> {
        let pending = self
            .pending
            .iter_mut()
            .find(|p| p.local_id == *local_id)
            .ok_or_else(|| ClientError::NotFound("pending message not found".to_string()))?;

        if pending.state != DeliveryState::Sending {
            return Err(ClientError::InvalidState("only a sending message can fail"));
        }

        pending.state = DeliveryState::Failed(failure);
        Ok(())
    }

    /// User bỏ hẳn một message Failed thay vì retry.
    pub fn abandon(&mut self, local_id: &Uuid) -> Option<PendingMessage> {
        let index = self.pending.iter().position(|p| p.local_id == *local_id)?;
        Some(self.pending.remove(index))
    }

    pub fn get(&self, local_id: &Uuid) -> Option<&PendingMessage> {
        self.pending.iter().find(|p| p.local_id == *local_id)
    }

    pub fn pending(&self) -> &[PendingMessage] {
        &self.pending
    }
}

/// Thao tác gửi phía dưới state machine. Cả HTTP fallback (ChatApi) lẫn
/// bất kỳ đường ack nào khác đều cắm qua trait này nên hội tụ về cùng
/// một bộ transition.
#[async_trait]
pub trait SendOp {
    async fn send(
        &self,
        target_id: Option<Uuid>,
        body: &str,
    ) -> Result<MessageEntity, ClientError>;
}

/// Driver chuẩn: submit → gọi send op → resolve hoặc fail.
pub async fn submit_and_send<O>(
    outbox: &mut Outbox,
    log: &mut ConversationLog,
    op: &O,
    local_id: Uuid,
) -> Result<MessageEntity, ClientError>
where
    O: SendOp + Sync,
{
    let pending = outbox.submit(&local_id)?;
    let target_id = pending.target_id;
    let body = pending.body.clone();

    match op.send(target_id, &body).await {
        Ok(stored) => {
            outbox.resolve(&local_id)?;
            log.insert(stored.clone());
            Ok(stored)
        }
        Err(error) => {
            let failure = SendFailure::from_error(&error);
            // submit vừa chuyển sang Sending nên fail không thể trượt
            let _ = outbox.fail(&local_id, failure);
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::sample_message;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// SendOp giả: fail `failures_left` lần đầu rồi trả về stored message.
    struct FlakySend {
        failures_left: AtomicUsize,
        error: ClientError,
        stored: MessageEntity,
        calls: AtomicUsize,
    }

    impl FlakySend {
        fn new(failures: usize, error: ClientError, stored: MessageEntity) -> Self {
            Self {
                failures_left: AtomicUsize::new(failures),
                error,
                stored,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SendOp for FlakySend {
        async fn send(
            &self,
            _target_id: Option<Uuid>,
            _body: &str,
        ) -> Result<MessageEntity, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                n.checked_sub(1)
            }).is_ok()
            {
                return Err(self.error.clone());
            }
            Ok(self.stored.clone())
        }
    }

    #[test]
    fn submit_is_only_legal_from_composing_or_failed() {
        let mut outbox = Outbox::new();
        let id = outbox.compose(None, "hello");

        outbox.submit(&id).unwrap();

        // Sending → submit lần nữa bị từ chối
        let double = outbox.submit(&id);
        assert_eq!(double.unwrap_err(), ClientError::InvalidState("message is already being sent"));

        // Failed → retry hợp lệ
        outbox.fail(&id, SendFailure::Transport("down".into())).unwrap();
        assert!(outbox.submit(&id).is_ok());
    }

    #[test]
    fn resolve_removes_pending_instead_of_relabeling() {
        let mut outbox = Outbox::new();
        let id = outbox.compose(None, "hello");
        outbox.submit(&id).unwrap();

        let stored = sample_message("hello", 1);
        let pending = outbox.resolve(&id).unwrap();

        assert!(outbox.get(&id).is_none());
        // id space tách biệt: local id không bao giờ trùng store id
        assert_ne!(pending.local_id, stored.id);
    }

    #[test]
    fn failed_message_stays_visible_with_its_failure() {
        let mut outbox = Outbox::new();
        let id = outbox.compose(None, "hello");
        outbox.submit(&id).unwrap();
        outbox.fail(&id, SendFailure::Rejected("empty body".into())).unwrap();

        let pending = outbox.get(&id).unwrap();
        match &pending.state {
            DeliveryState::Failed(failure) => {
                assert!(!failure.retryable());
                assert_eq!(*failure, SendFailure::Rejected("empty body".into()));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn retry_after_transport_failure_stores_exactly_one_message() {
        let mut outbox = Outbox::new();
        let mut log = ConversationLog::new();
        let stored = sample_message("hello", 1);
        let op = FlakySend::new(
            1,
            ClientError::Transport("connection reset".into()),
            stored.clone(),
        );

        let local_id = outbox.compose(None, "hello");

        // Lần đầu: transport lỗi → Failed, retryable
        let first = submit_and_send(&mut outbox, &mut log, &op, local_id).await;
        assert!(first.is_err());
        match &outbox.get(&local_id).unwrap().state {
            DeliveryState::Failed(failure) => assert!(failure.retryable()),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(log.len(), 0);

        // Retry: thành công → đúng một message trong log, outbox sạch
        let second = submit_and_send(&mut outbox, &mut log, &op, local_id).await.unwrap();
        assert_eq!(second.id, stored.id);
        assert_eq!(log.len(), 1);
        assert!(outbox.pending().is_empty());
        assert_eq!(op.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rejected_failure_requires_correction_not_retry() {
        let mut outbox = Outbox::new();
        let mut log = ConversationLog::new();
        let op = FlakySend::new(
            9,
            ClientError::Rejected("Message body must not be empty".into()),
            sample_message("x", 1),
        );

        let local_id = outbox.compose(None, "");
        let result = submit_and_send(&mut outbox, &mut log, &op, local_id).await;

        assert!(matches!(result, Err(ClientError::Rejected(_))));
        match &outbox.get(&local_id).unwrap().state {
            DeliveryState::Failed(failure) => assert!(!failure.retryable()),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_push_after_resolve_is_deduplicated_by_id() {
        let mut outbox = Outbox::new();
        let mut log = ConversationLog::new();
        let stored = sample_message("hello", 1);
        let op = FlakySend::new(0, ClientError::Closed, stored.clone());

        let local_id = outbox.compose(None, "hello");
        submit_and_send(&mut outbox, &mut log, &op, local_id).await.unwrap();

        // Server push cùng message (sender nhận lại event) → không nhân đôi
        assert!(!log.insert(stored));
        assert_eq!(log.len(), 1);
    }
}
