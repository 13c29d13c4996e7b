use actix_web::{get, post, put, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        conversation::repository_pg::ConversationRepositoryPg,
        message::{
            model::SendMessageRequest, repository_pg::MessageRepositoryPg,
            schema::MessageEntity, service::MessageService,
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::ValidatedJson,
};

type MessageSvc = MessageService<MessageRepositoryPg, ConversationRepositoryPg, UserRepositoryPg>;

/// Entry point request/response của optimistic send: response chính là ack
/// chuyển pending message sang Sent phía client.
#[post("/")]
pub async fn send_message(
    message_service: web::Data<MessageSvc>,
    body: ValidatedJson<SendMessageRequest>,
    req: HttpRequest,
) -> Result<success::Success<MessageEntity>, error::Error> {
    let claims = get_claims(&req)?;
    let message = message_service
        .send(claims.sub, claims.role, body.0.target_id, body.0.body)
        .await?;

    Ok(success::Success::created(Some(message)).message("Send message successfully"))
}

#[get("/")]
pub async fn get_my_messages(
    message_service: web::Data<MessageSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<MessageEntity>>, error::Error> {
    let claims = get_claims(&req)?;
    let messages = message_service.history_for_user(claims.sub).await?;

    Ok(success::Success::ok(Some(messages)).message("Successfully retrieved messages"))
}

#[put("/read")]
pub async fn mark_my_read(
    message_service: web::Data<MessageSvc>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let claims = get_claims(&req)?;
    message_service.mark_read_for_user(claims.sub).await?;

    Ok(success::Success::ok(None).message("Messages marked as read"))
}
