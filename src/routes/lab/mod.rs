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
    list_labs,
    available_labs,
    search_labs,
    get_lab,
    lab_equipment,
    create_lab,
    update_lab,
    delete_lab,
};
pub use model::{CreateLabRequest, LAB_STATUSES, LAB_TYPES, Lab, LabFilter, UpdateLabRequest};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_lab))
        .route("/{id}", put(update_lab).delete(delete_lab))
        .route_layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_labs))
        .route("/search", get(search_labs))
        .route("/available", get(available_labs))
        .route("/{id}", get(get_lab))
        .route("/{id}/equipment", get(lab_equipment))
        .merge(protected)
}
