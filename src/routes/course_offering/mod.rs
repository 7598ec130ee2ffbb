mod handler;
mod model;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use crate::AppState;
use crate::middleware::auth_middleware;

pub use handler::{
    list_offerings,
    search_offerings,
    get_offering,
    create_offering,
    update_offering,
    delete_offering,
    offering_classes,
    add_offering_class,
    remove_offering_class,
};
pub use model::{
    AddClassRequest, CourseOffering, CreateOfferingRequest, OFFERING_STATUSES, OfferingFilter,
    SEMESTERS, Term, UpdateOfferingRequest,
};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_offering))
        .route("/{id}", put(update_offering).delete(delete_offering))
        .route("/{id}/classes", post(add_offering_class))
        .route("/{id}/classes/{class_id}", delete(remove_offering_class))
        .route_layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_offerings))
        .route("/search", get(search_offerings))
        .route("/{id}", get(get_offering))
        .route("/{id}/classes", get(offering_classes))
        .merge(protected)
}
