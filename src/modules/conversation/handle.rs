use actix_web::{delete, get, put, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        conversation::{
            model::ConversationSummary, repository_pg::ConversationRepositoryPg,
            service::ConversationService,
        },
        message::{schema::MessageEntity, service::MessageService},
        user::repository_pg::UserRepositoryPg,
    },
};

type ConversationSvc = ConversationService<ConversationRepositoryPg>;
type MessageSvc = MessageService<
    crate::modules::message::repository_pg::MessageRepositoryPg,
    ConversationRepositoryPg,
    UserRepositoryPg,
>;

#[get("/")]
pub async fn get_conversations(
    conversation_svc: web::Data<ConversationSvc>,
) -> Result<success::Success<Vec<ConversationSummary>>, error::Error> {
    let conversations = conversation_svc.list_conversations().await?;

    Ok(success::Success::ok(Some(conversations)).message("Successfully retrieved conversations"))
}

#[delete("/{conversation_id}")]
pub async fn delete_conversation(
    conversation_svc: web::Data<ConversationSvc>,
    conversation_id: web::Path<Uuid>,
) -> Result<success::Success<()>, error::Error> {
    conversation_svc.delete_conversation(*conversation_id).await?;

    Ok(success::Success::ok(None).message("Conversation deleted"))
}

#[get("/{conversation_id}/messages")]
pub async fn get_messages(
    message_svc: web::Data<MessageSvc>,
    conversation_id: web::Path<Uuid>,
) -> Result<success::Success<Vec<MessageEntity>>, error::Error> {
    let messages = message_svc.history_for_conversation(*conversation_id).await?;

    Ok(success::Success::ok(Some(messages)).message("Successfully retrieved messages"))
}

#[put("/{conversation_id}/read")]
pub async fn mark_read(
    message_svc: web::Data<MessageSvc>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let claims = get_claims(&req)?;

    message_svc.mark_read_for_conversation(*conversation_id, claims.role).await?;

    Ok(success::Success::ok(None).message("Messages marked as read"))
}
