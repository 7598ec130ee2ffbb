mod handler;
mod model;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use crate::AppState;
use crate::middleware::{RoleGate, auth_middleware, require_role};

pub use handler::{
    list_teachers,
    all_teachers,
    get_teacher,
    create_teacher,
    update_teacher,
    delete_teacher,
};
pub use model::{CreateTeacherRequest, Teacher, TeacherOption, UpdateTeacherRequest};

/// 教师信息需要登录才能查看，增删改仅限管理员
pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create_teacher))
        .route("/{id}", put(update_teacher).delete(delete_teacher))
        .route_layer(from_fn_with_state(RoleGate::ADMIN, require_role));

    Router::new()
        .route("/", get(list_teachers))
        .route("/all", get(all_teachers))
        .route("/{id}", get(get_teacher))
        .merge(admin)
        .route_layer(from_fn_with_state(state, auth_middleware))
}
