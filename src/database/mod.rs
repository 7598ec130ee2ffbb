// 数据库访问层
// 连接池、事务原语以及动态 SQL 构造工具

pub mod query;

use std::time::Duration;

use sqlx::postgres::{PgPoolOptions, PgQueryResult};
use sqlx::{Executor, PgPool, Postgres, Transaction};

use crate::config::Config;

pub use query::{Filter, Patch, UpdateSet, like_pattern};

pub type PgTransaction = Transaction<'static, Postgres>;

pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(60))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'smart_lab_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
}

/// 连接测试
pub async fn ping(pool: &PgPool) -> bool {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Database ping failed: {}", e);
            false
        }
    }
}

pub async fn begin(pool: &PgPool) -> Result<PgTransaction, sqlx::Error> {
    pool.begin().await
}

pub async fn commit(tx: PgTransaction) -> Result<(), sqlx::Error> {
    tx.commit().await
}

pub async fn rollback(tx: PgTransaction) -> Result<(), sqlx::Error> {
    tx.rollback().await
}

pub fn affected(result: &PgQueryResult) -> bool {
    result.rows_affected() > 0
}
