mod handler;
mod model;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::AppState;
use crate::middleware::{RoleGate, auth_middleware, require_role};

pub use handler::{
    login,
    me,
    list_users,
    get_user,
    create_user,
    update_user,
    delete_user,
};
pub use model::{NewUser, ROLE_NAMES, Role, User, UserChanges};

pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(from_fn_with_state(RoleGate::ADMIN, require_role));

    let protected = Router::new()
        .route("/me", get(me))
        .merge(admin)
        .route_layer(from_fn_with_state(state, auth_middleware));

    Router::new().route("/login", post(login)).merge(protected)
}
