use axum::extract::{Path, State};

use crate::{
    AppState,
    error::AppError,
    result::{ApiResult, created, done, list, ok},
    routes::SearchQuery,
    utils::{parse_id, require_keyword},
    validation::{AppQuery, Validated},
};

use super::model::{Class, ClassFilter, ClassStats, CreateClassRequest, UpdateClassRequest};

const INVALID_CLASS_ID: &str = "无效的班级ID";

#[axum::debug_handler]
pub async fn list_classes(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ClassFilter>,
) -> ApiResult<Vec<Class>> {
    let classes = Class::list(&state.pool, filter).await?;
    list("获取班级列表成功", classes)
}

#[axum::debug_handler]
pub async fn search_classes(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Vec<Class>> {
    let keyword = require_keyword(query.keyword.as_deref())?;
    let classes = Class::search(&state.pool, keyword).await?;
    list("搜索班级成功", classes)
}

#[axum::debug_handler]
pub async fn class_stats(State(state): State<AppState>) -> ApiResult<ClassStats> {
    let stats = Class::stats(&state.pool).await?;
    ok("获取班级统计成功", stats)
}

#[axum::debug_handler]
pub async fn get_class(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Class> {
    let id = parse_id(&id, INVALID_CLASS_ID)?;
    let class = Class::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("班级不存在"))?;
    ok("获取班级成功", class)
}

#[axum::debug_handler]
pub async fn create_class(
    State(state): State<AppState>,
    Validated(req): Validated<CreateClassRequest>,
) -> ApiResult<Class> {
    if Class::find_by_key(&state.pool, &req.major, &req.grade, &req.class_number)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("该班级已存在"));
    }

    let id = Class::create(&state.pool, req)
        .await
        .map_err(AppError::unique_violation("该班级已存在"))?;
    let class = Class::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("新建班级 {} 读取失败", id)))?;
    created("班级创建成功", class)
}

#[axum::debug_handler]
pub async fn update_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(req): Validated<UpdateClassRequest>,
) -> ApiResult<Class> {
    let id = parse_id(&id, INVALID_CLASS_ID)?;
    let existing = Class::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("班级不存在"))?;

    if let Some((major, grade, class_number)) = req.merged_key(&existing) {
        let clash = Class::find_by_key(&state.pool, &major, &grade, &class_number).await?;
        if clash.is_some_and(|other| other.id != id) {
            return Err(AppError::conflict("该班级已存在"));
        }
    }

    if !Class::update(&state.pool, id, req)
        .await
        .map_err(AppError::unique_violation("该班级已存在"))?
    {
        return Err(AppError::bad_request("班级更新失败"));
    }

    let class = Class::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("班级不存在"))?;
    ok("班级更新成功", class)
}

#[axum::debug_handler]
pub async fn delete_class(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id, INVALID_CLASS_ID)?;
    if Class::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("班级不存在"));
    }

    if !Class::delete(&state.pool, id).await? {
        return Err(AppError::bad_request("班级删除失败"));
    }
    done("班级删除成功")
}
