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
    list_equipment,
    available_equipment,
    search_equipment,
    equipment_stats,
    get_equipment,
    create_equipment,
    update_equipment,
    delete_equipment,
};
pub use model::{
    CreateEquipmentRequest, EQUIPMENT_STATUSES, Equipment, EquipmentFilter, EquipmentStats,
    UpdateEquipmentRequest,
};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_equipment))
        .route("/{id}", put(update_equipment).delete(delete_equipment))
        .route_layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(list_equipment))
        .route("/search", get(search_equipment))
        .route("/available", get(available_equipment))
        .route("/stats/equipment", get(equipment_stats))
        .route("/{id}", get(get_equipment))
        .merge(protected)
}
