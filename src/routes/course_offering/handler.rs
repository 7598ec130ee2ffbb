use axum::extract::{Path, State};

use crate::{
    AppState,
    error::AppError,
    result::{ApiResult, created, done, list, ok},
    routes::SearchQuery,
    routes::{class::Class, course::Course, equipment::Equipment, teacher::Teacher},
    utils::{parse_id, require_keyword},
    validation::{AppQuery, Validated},
};

use super::model::{
    ACTIVE, AddClassRequest, AssociationCreated, CourseOffering, CreateOfferingRequest,
    OfferingFilter, UpdateOfferingRequest,
};

const INVALID_OFFERING_ID: &str = "无效的开课信息ID";
const INVALID_CLASS_ID: &str = "无效的班级ID";
const TERM_TAKEN: &str = "该课程在当前学期已开设";

/// 引用的课程、教师、设备必须存在
async fn check_references(
    state: &AppState,
    course_id: Option<i64>,
    teacher_id: Option<i64>,
    equipment_id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(course_id) = course_id {
        if Course::find_by_id(&state.pool, course_id).await?.is_none() {
            return Err(AppError::not_found("课程不存在"));
        }
    }
    if let Some(teacher_id) = teacher_id {
        if Teacher::find_by_id(&state.pool, teacher_id).await?.is_none() {
            return Err(AppError::not_found("教师不存在"));
        }
    }
    if let Some(equipment_id) = equipment_id {
        if Equipment::find_by_id(&state.pool, equipment_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("设备不存在"));
        }
    }
    Ok(())
}

async fn find_offering(state: &AppState, id: i64) -> Result<CourseOffering, AppError> {
    CourseOffering::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("开课信息不存在"))
}

#[axum::debug_handler]
pub async fn list_offerings(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<OfferingFilter>,
) -> ApiResult<Vec<CourseOffering>> {
    let offerings = CourseOffering::list(&state.pool, filter).await?;
    list("获取开课信息列表成功", offerings)
}

#[axum::debug_handler]
pub async fn search_offerings(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> ApiResult<Vec<CourseOffering>> {
    let keyword = require_keyword(query.keyword.as_deref())?;
    let offerings = CourseOffering::search(&state.pool, keyword).await?;
    list("搜索开课信息成功", offerings)
}

#[axum::debug_handler]
pub async fn get_offering(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CourseOffering> {
    let id = parse_id(&id, INVALID_OFFERING_ID)?;
    let offering = find_offering(&state, id).await?;
    ok("获取开课信息成功", offering)
}

#[axum::debug_handler]
pub async fn create_offering(
    State(state): State<AppState>,
    Validated(req): Validated<CreateOfferingRequest>,
) -> ApiResult<CourseOffering> {
    check_references(
        &state,
        Some(req.course_id),
        Some(req.teacher_id),
        req.equipment_id,
    )
    .await?;

    if req.status() == ACTIVE
        && CourseOffering::find_active_for_term(
            &state.pool,
            req.course_id,
            &req.semester,
            &req.academic_year,
        )
        .await?
        .is_some()
    {
        return Err(AppError::conflict(TERM_TAKEN));
    }

    // 并发创建时由部分唯一索引兜底
    let id = CourseOffering::create(&state.pool, req)
        .await
        .map_err(AppError::unique_violation(TERM_TAKEN))?;
    let offering = CourseOffering::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("新建开课信息 {} 读取失败", id)))?;
    created("开课信息创建成功", offering)
}

#[axum::debug_handler]
pub async fn update_offering(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(req): Validated<UpdateOfferingRequest>,
) -> ApiResult<CourseOffering> {
    let id = parse_id(&id, INVALID_OFFERING_ID)?;
    let existing = find_offering(&state, id).await?;

    check_references(
        &state,
        req.course_id.value().copied().filter(|v| *v != existing.course_id),
        req.teacher_id.value().copied().filter(|v| *v != existing.teacher_id),
        req.equipment_id
            .value()
            .copied()
            .filter(|v| Some(*v) != existing.equipment_id),
    )
    .await?;

    if let Some(term) = req.merged_term(&existing).filter(|term| term.status == ACTIVE) {
        let clash = CourseOffering::find_active_for_term(
            &state.pool,
            term.course_id,
            &term.semester,
            &term.academic_year,
        )
        .await?;
        if clash.is_some_and(|other| other.id != id) {
            return Err(AppError::conflict(TERM_TAKEN));
        }
    }

    if !CourseOffering::update(&state.pool, id, req)
        .await
        .map_err(AppError::unique_violation(TERM_TAKEN))?
    {
        return Err(AppError::bad_request("开课信息更新失败"));
    }

    let offering = find_offering(&state, id).await?;
    ok("开课信息更新成功", offering)
}

#[axum::debug_handler]
pub async fn delete_offering(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, INVALID_OFFERING_ID)?;
    find_offering(&state, id).await?;

    if !CourseOffering::delete(&state.pool, id).await? {
        return Err(AppError::bad_request("开课信息删除失败"));
    }
    done("开课信息删除成功")
}

#[axum::debug_handler]
pub async fn offering_classes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Class>> {
    let id = parse_id(&id, INVALID_OFFERING_ID)?;
    find_offering(&state, id).await?;

    let classes = CourseOffering::classes(&state.pool, id).await?;
    list("获取开课班级成功", classes)
}

#[axum::debug_handler]
pub async fn add_offering_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(req): Validated<AddClassRequest>,
) -> ApiResult<AssociationCreated> {
    let id = parse_id(&id, INVALID_OFFERING_ID)?;
    find_offering(&state, id).await?;

    if Class::find_by_id(&state.pool, req.class_id).await?.is_none() {
        return Err(AppError::not_found("班级不存在"));
    }
    if CourseOffering::has_class(&state.pool, id, req.class_id).await? {
        return Err(AppError::conflict("该班级已添加到此开课信息"));
    }

    let association = CourseOffering::add_class(&state.pool, id, req.class_id)
        .await
        .map_err(AppError::unique_violation("该班级已添加到此开课信息"))?;
    created("添加班级成功", AssociationCreated { id: association })
}

#[axum::debug_handler]
pub async fn remove_offering_class(
    State(state): State<AppState>,
    Path((id, class_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let id = parse_id(&id, INVALID_OFFERING_ID)?;
    let class_id = parse_id(&class_id, INVALID_CLASS_ID)?;
    find_offering(&state, id).await?;

    if !CourseOffering::remove_class(&state.pool, id, class_id).await? {
        return Err(AppError::not_found("该班级未添加到此开课信息"));
    }
    done("移除班级成功")
}
