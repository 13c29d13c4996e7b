use std::sync::LazyLock;

pub mod api;
pub mod client;
pub mod configs;
pub mod constants;
pub mod middlewares;
pub mod modules;
pub mod utils;

#[cfg(test)]
mod test;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::try_init().ok();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});
