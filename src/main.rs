use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use smart_lab::{
    AppState,
    config::Config,
    database,
    routes::{self, auth::{NewUser, User}},
    utils::hash_password,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env()?;

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 连接数据库并执行迁移
    let pool = database::connect(&config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    bootstrap_admin(&pool, &config).await?;

    let state = AppState {
        pool,
        config: config.clone(),
    };
    let router = routes::router(state);

    // 开发模式允许所有来源跨域
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}

/// 首次启动时创建默认管理员
async fn bootstrap_admin(
    pool: &sqlx::PgPool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let admin = NewUser {
        username: config.admin_username.clone(),
        password_hash: hash_password(&config.admin_password)?,
        name: config.admin_name.clone(),
        role: "admin".to_string(),
    };

    match User::bootstrap_admin(pool, admin).await? {
        Some(id) => tracing::info!(
            "Created default admin {} ({}), change its password after first login",
            config.admin_username,
            id
        ),
        None => tracing::debug!("Skipped admin bootstrap, an admin or the configured username already exists"),
    }
    Ok(())
}
