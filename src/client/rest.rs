/// REST Api Client
///
/// Các thao tác request/response độc lập với kênh live: fetch history,
/// gửi tin (đường ack của optimistic send), mark read, directory và xóa
/// conversation. Khi kênh live degraded thì đây cũng là đường fallback -
/// cả hai đường hội tụ về cùng service phía server.
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::client::delivery::SendOp;
use crate::client::error::ClientError;
use crate::modules::conversation::model::ConversationSummary;
use crate::modules::message::schema::MessageEntity;

#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    /// Append không ack trong timeout này → pending chuyển Failed(Transport)
    /// thay vì treo vô hạn
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Envelope `{ data, message }` của server
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[allow(unused)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct ChatApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ChatApi {
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    /// POST /api/messages - response là ack chuyển pending sang Sent.
    pub async fn send_message(
        &self,
        target_id: Option<Uuid>,
        body: &str,
    ) -> Result<MessageEntity, ClientError> {
        let payload = serde_json::json!({ "targetId": target_id, "body": body });
        let request = self.http.post(format!("{}/api/messages/", self.base_url)).json(&payload);
        self.request_json(request).await
    }

    /// GET /api/messages - history thread của chính user.
    pub async fn my_history(&self) -> Result<Vec<MessageEntity>, ClientError> {
        let request = self.http.get(format!("{}/api/messages/", self.base_url));
        self.request_json(request).await
    }

    /// PUT /api/messages/read - user đánh dấu đã đọc tin của agent.
    pub async fn mark_my_read(&self) -> Result<(), ClientError> {
        let request = self.http.put(format!("{}/api/messages/read", self.base_url));
        self.request_empty(request).await
    }

    /// GET /api/conversations - directory phía admin.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ClientError> {
        let request = self.http.get(format!("{}/api/conversations/", self.base_url));
        self.request_json(request).await
    }

    /// GET /api/conversations/{id}/messages
    pub async fn conversation_history(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<MessageEntity>, ClientError> {
        let request = self
            .http
            .get(format!("{}/api/conversations/{}/messages", self.base_url, conversation_id));
        self.request_json(request).await
    }

    /// PUT /api/conversations/{id}/read
    pub async fn mark_conversation_read(&self, conversation_id: Uuid) -> Result<(), ClientError> {
        let request = self
            .http
            .put(format!("{}/api/conversations/{}/read", self.base_url, conversation_id));
        self.request_empty(request).await
    }

    /// DELETE /api/conversations/{id} - one-shot, lần hai trả NotFound.
    pub async fn delete_conversation(&self, conversation_id: Uuid) -> Result<(), ClientError> {
        let request =
            self.http.delete(format!("{}/api/conversations/{}", self.base_url, conversation_id));
        self.request_empty(request).await
    }

    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send_request(request).await?;

        let envelope: Envelope<T> =
            response.json().await.map_err(|e| ClientError::Transport(e.to_string()))?;

        envelope.data.ok_or_else(|| ClientError::Transport("response missing data".to_string()))
    }

    async fn request_empty(&self, request: reqwest::RequestBuilder) -> Result<(), ClientError> {
        self.send_request(request).await?;
        Ok(())
    }

    async fn send_request(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(error_from_status(status.as_u16(), message));
        }

        Ok(response)
    }
}

fn map_reqwest_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::Transport("request timed out".to_string())
    } else if error.is_connect() {
        ClientError::Network(error.to_string())
    } else {
        ClientError::Transport(error.to_string())
    }
}

/// Map HTTP status về taxonomy phía client: 4xx validation → Rejected
/// (cần sửa input), 401/403 → Auth, 404 → NotFound, 5xx → Transport
/// (transient, retry được).
fn error_from_status(status: u16, message: String) -> ClientError {
    match status {
        400 | 422 => ClientError::Rejected(message),
        401 | 403 => ClientError::Auth(message),
        404 => ClientError::NotFound(message),
        _ => ClientError::Transport(message),
    }
}

#[async_trait]
impl SendOp for ChatApi {
    async fn send(
        &self,
        target_id: Option<Uuid>,
        body: &str,
    ) -> Result<MessageEntity, ClientError> {
        self.send_message(target_id, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification_follows_the_taxonomy() {
        assert!(matches!(error_from_status(400, "x".into()), ClientError::Rejected(_)));
        assert!(matches!(error_from_status(422, "x".into()), ClientError::Rejected(_)));
        assert!(matches!(error_from_status(401, "x".into()), ClientError::Auth(_)));
        assert!(matches!(error_from_status(403, "x".into()), ClientError::Auth(_)));
        assert!(matches!(error_from_status(404, "x".into()), ClientError::NotFound(_)));
        assert!(matches!(error_from_status(500, "x".into()), ClientError::Transport(_)));
        assert!(matches!(error_from_status(503, "x".into()), ClientError::Transport(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let api = ChatApi::new(ApiConfig::new("http://localhost:8080/", "token")).unwrap();
        assert_eq!(api.base_url, "http://localhost:8080");
    }
}
