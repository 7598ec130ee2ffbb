use axum::extract::{Path, State};

use crate::{
    AppState,
    error::AppError,
    result::{ApiResult, Paged, created, done, list, ok},
    utils::{Pagination, parse_id},
    validation::{AppQuery, Validated},
};

use super::model::{
    CreateTeacherRequest, Teacher, TeacherListQuery, TeacherOption, UpdateTeacherRequest,
};

const INVALID_TEACHER_ID: &str = "无效的教师ID";

#[axum::debug_handler]
pub async fn list_teachers(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TeacherListQuery>,
) -> ApiResult<Paged<Teacher>> {
    let page = Pagination::from_query(query.page.as_deref(), query.limit.as_deref());
    let department = query
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let (teachers, total) = Teacher::list(&state.pool, page, department).await?;
    ok(
        "获取教师列表成功",
        Paged::new(teachers, total, page.page, page.limit),
    )
}

#[axum::debug_handler]
pub async fn all_teachers(State(state): State<AppState>) -> ApiResult<Vec<TeacherOption>> {
    let teachers = Teacher::list_options(&state.pool).await?;
    list("获取教师列表成功", teachers)
}

#[axum::debug_handler]
pub async fn get_teacher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Teacher> {
    let id = parse_id(&id, INVALID_TEACHER_ID)?;
    let teacher = Teacher::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("教师不存在"))?;
    ok("获取教师信息成功", teacher)
}

#[axum::debug_handler]
pub async fn create_teacher(
    State(state): State<AppState>,
    Validated(req): Validated<CreateTeacherRequest>,
) -> ApiResult<Teacher> {
    if Teacher::find_by_teacher_id(&state.pool, &req.teacher_id)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("教师工号已存在"));
    }

    let id = Teacher::create(&state.pool, req)
        .await
        .map_err(AppError::unique_violation("教师工号已存在"))?;
    let teacher = Teacher::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("新建教师 {} 读取失败", id)))?;
    created("教师创建成功", teacher)
}

#[axum::debug_handler]
pub async fn update_teacher(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(req): Validated<UpdateTeacherRequest>,
) -> ApiResult<Teacher> {
    let id = parse_id(&id, INVALID_TEACHER_ID)?;
    if Teacher::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("教师不存在"));
    }

    if !Teacher::update(&state.pool, id, req).await? {
        return Err(AppError::bad_request("教师更新失败"));
    }

    let teacher = Teacher::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("教师不存在"))?;
    ok("教师更新成功", teacher)
}

#[axum::debug_handler]
pub async fn delete_teacher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, INVALID_TEACHER_ID)?;
    if Teacher::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("教师不存在"));
    }

    if !Teacher::delete(&state.pool, id).await? {
        return Err(AppError::bad_request("教师删除失败"));
    }
    done("教师删除成功")
}
