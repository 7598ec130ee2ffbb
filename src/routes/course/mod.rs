mod handler;
mod model;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use crate::AppState;
use crate::middleware::auth_middleware;

pub use handler::{
    list_courses,
    search_courses,
    get_course,
    create_course,
    update_course,
    delete_course,
};
pub use model::{COURSE_TYPES, Course, CreateCourseRequest, UpdateCourseRequest};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_course))
        .route("/{id}", put(update_course).delete(delete_course))
        .route_layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_courses))
        .route("/search", get(search_courses))
        .route("/{id}", get(get_course))
        .merge(protected)
}
