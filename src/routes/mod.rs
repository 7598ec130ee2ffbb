pub mod auth;
pub mod class;
pub mod course;
pub mod course_offering;
pub mod equipment;
pub mod lab;
pub mod teacher;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    AppState, database,
    error::error_codes,
    middleware::log_errors,
    result::{ApiResponse, ApiResult, ok},
};

/// 各实体搜索接口共用的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub database: String,
}

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> ApiResult<Health> {
    let database = if database::ping(&state.pool).await {
        "up"
    } else {
        "down"
    };
    ok(
        "智慧实验室系统后端服务运行正常",
        Health {
            status: "OK".to_string(),
            database: database.to_string(),
        },
    )
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::failure(
            "接口不存在",
            error_codes::NOT_FOUND,
            None,
        )),
    )
}

/// 组装完整的应用路由
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router(state.clone()))
        .nest("/teachers", teacher::router(state.clone()))
        .nest("/courses", course::router(state.clone()))
        .nest("/labs", lab::router(state.clone()))
        .nest("/equipment", equipment::router(state.clone()))
        .nest("/classes", class::router(state.clone()))
        .nest("/course-offerings", course_offering::router(state.clone()));

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .fallback(not_found)
        .layer(axum::middleware::from_fn(log_errors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
