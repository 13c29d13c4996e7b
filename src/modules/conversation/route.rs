use actix_web::{
    middleware::from_fn,
    web::{scope, ServiceConfig},
};

use crate::middlewares::{authentication, authorization};
use crate::modules::conversation::handle::*;
use crate::modules::user::schema::UserRole;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/conversations")
            .wrap(from_fn(authorization(vec![UserRole::Admin])))
            .wrap(from_fn(authentication))
            .service(get_conversations)
            .service(delete_conversation)
            .service(get_messages)
            .service(mark_read),
    );
}
