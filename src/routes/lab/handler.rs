use axum::extract::{Path, State};

use crate::{
    AppState,
    error::AppError,
    result::{ApiResult, created, done, list, ok},
    routes::SearchQuery,
    routes::equipment::Equipment,
    utils::{parse_id, require_keyword},
    validation::{AppQuery, Validated},
};

use super::model::{CreateLabRequest, Lab, LabFilter, UpdateLabRequest};

const INVALID_LAB_ID: &str = "无效的实验室ID";

#[axum::debug_handler]
pub async fn list_labs(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<LabFilter>,
) -> ApiResult<Vec<Lab>> {
    let labs = Lab::list(&state.pool, filter).await?;
    list("获取实验室列表成功", labs)
}

#[axum::debug_handler]
pub async fn available_labs(State(state): State<AppState>) -> ApiResult<Vec<Lab>> {
    let labs = Lab::list_available(&state.pool).await?;
    list("获取可用实验室成功", labs)
}

#[axum::debug_handler]
pub async fn search_labs(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Vec<Lab>> {
    let keyword = require_keyword(query.keyword.as_deref())?;
    let labs = Lab::search(&state.pool, keyword).await?;
    list("搜索实验室成功", labs)
}

#[axum::debug_handler]
pub async fn get_lab(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Lab> {
    let id = parse_id(&id, INVALID_LAB_ID)?;
    let lab = Lab::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("实验室不存在"))?;
    ok("获取实验室成功", lab)
}

#[axum::debug_handler]
pub async fn lab_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Equipment>> {
    let id = parse_id(&id, INVALID_LAB_ID)?;
    if Lab::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("实验室不存在"));
    }

    let equipment = Equipment::list_by_lab(&state.pool, id).await?;
    list("获取实验室设备成功", equipment)
}

#[axum::debug_handler]
pub async fn create_lab(
    State(state): State<AppState>,
    Validated(req): Validated<CreateLabRequest>,
) -> ApiResult<Lab> {
    if Lab::find_by_name(&state.pool, &req.name).await?.is_some() {
        return Err(AppError::conflict("实验室名称已存在"));
    }

    let id = Lab::create(&state.pool, req)
        .await
        .map_err(AppError::unique_violation("实验室名称已存在"))?;
    let lab = Lab::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("新建实验室 {} 读取失败", id)))?;
    created("实验室创建成功", lab)
}

#[axum::debug_handler]
pub async fn update_lab(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(req): Validated<UpdateLabRequest>,
) -> ApiResult<Lab> {
    let id = parse_id(&id, INVALID_LAB_ID)?;
    let existing = Lab::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("实验室不存在"))?;

    if let Some(name) = req.name.value().filter(|name| **name != existing.name) {
        if Lab::find_by_name(&state.pool, name).await?.is_some() {
            return Err(AppError::conflict("实验室名称已存在"));
        }
    }

    if !Lab::update(&state.pool, id, req)
        .await
        .map_err(AppError::unique_violation("实验室名称已存在"))?
    {
        return Err(AppError::bad_request("实验室更新失败"));
    }

    let lab = Lab::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("实验室不存在"))?;
    ok("实验室更新成功", lab)
}

#[axum::debug_handler]
pub async fn delete_lab(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id, INVALID_LAB_ID)?;
    if Lab::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("实验室不存在"));
    }

    if !Lab::delete(&state.pool, id).await? {
        return Err(AppError::bad_request("实验室删除失败"));
    }
    done("实验室删除成功")
}
