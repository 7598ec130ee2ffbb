use axum::extract::{Path, State};

use crate::{
    AppState,
    error::AppError,
    result::{ApiResult, created, done, list, ok},
    routes::SearchQuery,
    utils::{parse_id, require_keyword},
    validation::{AppQuery, Validated},
};

use super::model::{Course, CreateCourseRequest, UpdateCourseRequest};

const INVALID_COURSE_ID: &str = "无效的课程ID";

#[axum::debug_handler]
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Vec<Course>> {
    let courses = Course::list(&state.pool).await?;
    list("获取课程列表成功", courses)
}

#[axum::debug_handler]
pub async fn search_courses(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Vec<Course>> {
    let keyword = require_keyword(query.keyword.as_deref())?;
    let courses = Course::search(&state.pool, keyword).await?;
    list("搜索课程成功", courses)
}

#[axum::debug_handler]
pub async fn get_course(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Course> {
    let id = parse_id(&id, INVALID_COURSE_ID)?;
    let course = Course::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("课程不存在"))?;
    ok("获取课程成功", course)
}

#[axum::debug_handler]
pub async fn create_course(
    State(state): State<AppState>,
    Validated(req): Validated<CreateCourseRequest>,
) -> ApiResult<Course> {
    if Course::find_by_code(&state.pool, &req.code).await?.is_some() {
        return Err(AppError::conflict("课程代码已存在"));
    }

    let id = Course::create(&state.pool, req)
        .await
        .map_err(AppError::unique_violation("课程代码已存在"))?;
    let course = Course::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("新建课程 {} 读取失败", id)))?;
    created("课程创建成功", course)
}

#[axum::debug_handler]
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(req): Validated<UpdateCourseRequest>,
) -> ApiResult<Course> {
    let id = parse_id(&id, INVALID_COURSE_ID)?;
    let existing = Course::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("课程不存在"))?;

    if let Some(code) = req.code.value().filter(|code| **code != existing.code) {
        if Course::find_by_code(&state.pool, code).await?.is_some() {
            return Err(AppError::conflict("课程代码已存在"));
        }
    }

    if !Course::update(&state.pool, id, req)
        .await
        .map_err(AppError::unique_violation("课程代码已存在"))?
    {
        return Err(AppError::bad_request("课程更新失败"));
    }

    let course = Course::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("课程不存在"))?;
    ok("课程更新成功", course)
}

#[axum::debug_handler]
pub async fn delete_course(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_id(&id, INVALID_COURSE_ID)?;
    if Course::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("课程不存在"));
    }

    if !Course::delete(&state.pool, id).await? {
        return Err(AppError::bad_request("课程删除失败"));
    }
    done("课程删除成功")
}
