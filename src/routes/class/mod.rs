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
    list_classes,
    search_classes,
    class_stats,
    get_class,
    create_class,
    update_class,
    delete_class,
};
pub use model::{
    CLASS_STATUSES, Class, ClassFilter, ClassStats, CreateClassRequest, DepartmentStat,
    UpdateClassRequest,
};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_class))
        .route("/{id}", put(update_class).delete(delete_class))
        .route_layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_classes))
        .route("/search", get(search_classes))
        .route("/stats/classes", get(class_stats))
        .route("/{id}", get(get_class))
        .merge(protected)
}
