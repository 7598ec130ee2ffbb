use config::Config;
use sqlx::PgPool;

pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod result;
pub mod routes;
pub mod utils;
pub mod validation;

/// 注入到每个处理函数的共享状态
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}
