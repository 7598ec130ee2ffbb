use axum::extract::{Path, State};

use crate::{
    AppState,
    error::AppError,
    result::{ApiResult, created, done, list, ok},
    routes::SearchQuery,
    routes::lab::Lab,
    utils::{parse_id, require_keyword},
    validation::{AppQuery, Validated},
};

use super::model::{
    CreateEquipmentRequest, Equipment, EquipmentFilter, EquipmentStats, UpdateEquipmentRequest,
};

const INVALID_EQUIPMENT_ID: &str = "无效的设备ID";

#[axum::debug_handler]
pub async fn list_equipment(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<EquipmentFilter>,
) -> ApiResult<Vec<Equipment>> {
    let equipment = Equipment::list(&state.pool, filter).await?;
    list("获取设备列表成功", equipment)
}

#[axum::debug_handler]
pub async fn available_equipment(State(state): State<AppState>) -> ApiResult<Vec<Equipment>> {
    let equipment = Equipment::list_available(&state.pool).await?;
    list("获取可用设备成功", equipment)
}

#[axum::debug_handler]
pub async fn search_equipment(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Vec<Equipment>> {
    let keyword = require_keyword(query.keyword.as_deref())?;
    let equipment = Equipment::search(&state.pool, keyword).await?;
    list("搜索设备成功", equipment)
}

#[axum::debug_handler]
pub async fn equipment_stats(State(state): State<AppState>) -> ApiResult<EquipmentStats> {
    let stats = Equipment::stats(&state.pool).await?;
    ok("获取设备统计成功", stats)
}

#[axum::debug_handler]
pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Equipment> {
    let id = parse_id(&id, INVALID_EQUIPMENT_ID)?;
    let equipment = Equipment::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("设备不存在"))?;
    ok("获取设备成功", equipment)
}

#[axum::debug_handler]
pub async fn create_equipment(
    State(state): State<AppState>,
    Validated(req): Validated<CreateEquipmentRequest>,
) -> ApiResult<Equipment> {
    if Lab::find_by_id(&state.pool, req.lab_id).await?.is_none() {
        return Err(AppError::not_found("实验室不存在"));
    }
    if let Some(serial) = req.serial_number.as_deref() {
        if Equipment::find_by_serial_number(&state.pool, serial)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("设备序列号已存在"));
        }
    }

    let id = Equipment::create(&state.pool, req)
        .await
        .map_err(AppError::unique_violation("设备序列号已存在"))?;
    let equipment = Equipment::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("新建设备 {} 读取失败", id)))?;
    created("设备创建成功", equipment)
}

#[axum::debug_handler]
pub async fn update_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(req): Validated<UpdateEquipmentRequest>,
) -> ApiResult<Equipment> {
    let id = parse_id(&id, INVALID_EQUIPMENT_ID)?;
    let existing = Equipment::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("设备不存在"))?;

    if let Some(lab_id) = req.lab_id.value().filter(|lab_id| **lab_id != existing.lab_id) {
        if Lab::find_by_id(&state.pool, *lab_id).await?.is_none() {
            return Err(AppError::not_found("实验室不存在"));
        }
    }
    if let Some(serial) = req
        .serial_number
        .value()
        .filter(|serial| existing.serial_number.as_ref() != Some(*serial))
    {
        if Equipment::find_by_serial_number(&state.pool, serial)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("设备序列号已存在"));
        }
    }

    if !Equipment::update(&state.pool, id, req)
        .await
        .map_err(AppError::unique_violation("设备序列号已存在"))?
    {
        return Err(AppError::bad_request("设备更新失败"));
    }

    let equipment = Equipment::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("设备不存在"))?;
    ok("设备更新成功", equipment)
}

#[axum::debug_handler]
pub async fn delete_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, INVALID_EQUIPMENT_ID)?;
    if Equipment::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("设备不存在"));
    }

    if !Equipment::delete(&state.pool, id).await? {
        return Err(AppError::bad_request("设备删除失败"));
    }
    done("设备删除成功")
}
