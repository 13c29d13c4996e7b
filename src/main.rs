use actix::Actor;
use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    middleware::Logger,
    web,
};
use std::sync::Arc;

use support_chat::{
    configs::connect_database,
    modules::{
        conversation::{self, repository_pg::ConversationRepositoryPg, service::ConversationService},
        message::{self, repository_pg::MessageRepositoryPg, service::MessageService},
        user::repository_pg::UserRepositoryPg,
        websocket::{handler::chat_ws, server::ChatServer},
    },
    ENV,
};

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let user_repo = UserRepositoryPg::new(db_pool.clone());
    let conversation_repo = ConversationRepositoryPg::new(db_pool.clone());
    let message_repo = MessageRepositoryPg::new(db_pool.clone());

    let chat_server = ChatServer::new().start();

    let message_service = MessageService::with_dependencies(
        Arc::new(message_repo),
        Arc::new(conversation_repo.clone()),
        Arc::new(user_repo),
        Some(Arc::new(chat_server.clone())),
    );
    let conversation_service =
        ConversationService::with_dependencies(Arc::new(conversation_repo));

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allow_any_header()
            .allow_any_method()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(message_service.clone()))
            .app_data(web::Data::new(conversation_service.clone()))
            .app_data(web::Data::new(chat_server.clone()))
            .service(health_check)
            .route("/ws", web::get().to(chat_ws))
            .service(
                web::scope("/api")
                    .configure(conversation::route::configure)
                    .configure(message::route::configure),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
