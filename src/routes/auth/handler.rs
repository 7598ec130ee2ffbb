use axum::extract::{Extension, Path, State};

use crate::{
    AppState,
    database::Patch,
    error::AppError,
    middleware::CurrentUser,
    result::{ApiResult, Paged, created, done, ok},
    utils::{Pagination, generate_token, hash_password, parse_id, verify_password},
    validation::{AppQuery, Validated},
};

use super::model::{
    CreateUserRequest, LoginRequest, LoginResponse, NewUser, UpdateUserRequest, User,
    UserChanges, UserListQuery,
};

const INVALID_USER_ID: &str = "无效的用户ID";

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Validated(req): Validated<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let user = User::find_by_username(&state.pool, &req.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("用户名或密码错误".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::info!("Failed login attempt for {}", req.username);
        return Err(AppError::Unauthorized("用户名或密码错误".to_string()));
    }

    let (token, expires_at) = generate_token(user.id, &user.username, &user.role, &state.config)
        .map_err(|e| AppError::Internal(format!("生成令牌失败: {}", e)))?;

    tracing::info!("User {} logged in", user.username);
    ok(
        "登录成功",
        LoginResponse {
            user,
            token,
            expires_at,
        },
    )
}

#[axum::debug_handler]
pub async fn me(Extension(user): Extension<CurrentUser>) -> ApiResult<CurrentUser> {
    ok("获取用户信息成功", user)
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> ApiResult<Paged<User>> {
    let page = Pagination::from_query(query.page.as_deref(), query.limit.as_deref());
    let role = query.role.filter(|r| !r.trim().is_empty());

    let (users, total) = User::list(&state.pool, page, role).await?;
    ok(
        "获取用户列表成功",
        Paged::new(users, total, page.page, page.limit),
    )
}

#[axum::debug_handler]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    let id = parse_id(&id, INVALID_USER_ID)?;
    let user = User::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("用户不存在"))?;
    ok("获取用户成功", user)
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Validated(req): Validated<CreateUserRequest>,
) -> ApiResult<User> {
    if User::find_by_username(&state.pool, &req.username)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("用户名已存在"));
    }

    let password_hash = hash_password(&req.password)?;
    let id = User::create(
        &state.pool,
        NewUser {
            username: req.username,
            password_hash,
            name: req.name,
            role: req.role,
        },
    )
    .await
    .map_err(AppError::unique_violation("用户名已存在"))?;

    let user = User::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("新建用户 {} 读取失败", id)))?;
    created("用户创建成功", user)
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(req): Validated<UpdateUserRequest>,
) -> ApiResult<User> {
    let id = parse_id(&id, INVALID_USER_ID)?;
    if User::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("用户不存在"));
    }

    let password_hash = match req.password.value() {
        Some(password) => Patch::Value(hash_password(password)?),
        None => Patch::Absent,
    };
    let changes = UserChanges {
        name: req.name,
        password_hash,
        role: req.role,
    };

    if !User::update(&state.pool, id, changes).await? {
        return Err(AppError::bad_request("用户更新失败"));
    }

    let user = User::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("用户不存在"))?;
    ok("用户更新成功", user)
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, INVALID_USER_ID)?;
    if id == current.id {
        return Err(AppError::bad_request("不能删除当前登录用户"));
    }
    if User::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("用户不存在"));
    }

    if !User::delete(&state.pool, id).await? {
        return Err(AppError::bad_request("用户删除失败"));
    }
    tracing::info!("User {} deleted by {}", id, current.username);
    done("用户删除成功")
}
