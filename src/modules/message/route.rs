use actix_web::{
    middleware::from_fn,
    web::{scope, ServiceConfig},
};

use crate::middlewares::{authentication, authorization};
use crate::modules::message::handle::*;
use crate::modules::user::schema::UserRole;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/messages")
            .wrap(from_fn(authorization(vec![UserRole::User, UserRole::Admin])))
            .wrap(from_fn(authentication))
            .service(send_message)
            .service(get_my_messages)
            .service(mark_my_read),
    );
}
