use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde::Serialize;

use crate::{
    AppState,
    error::AppError,
    routes::auth::{Role, User},
    utils::verify_token,
};

/// 通过认证后附加到请求上的身份
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
}

/// 校验 Bearer 令牌并确认用户仍然存在
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or_else(|| AppError::Unauthorized("未提供访问令牌".to_string()))?;

    let claims = verify_token(&token, &state.config)?;

    let user = User::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("用户不存在".to_string()))?;

    // 角色以数据库中的当前值为准
    let role = Role::parse(&user.role).ok_or_else(|| {
        tracing::warn!("User {} has unknown role {}", user.id, user.role);
        AppError::Forbidden("权限不足".to_string())
    })?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        name: user.name,
        role,
    });

    Ok(next.run(req).await)
}

/// 静态角色门禁
#[derive(Debug, Clone, Copy)]
pub struct RoleGate {
    pub roles: &'static [Role],
    pub message: &'static str,
}

impl RoleGate {
    pub const ADMIN: RoleGate = RoleGate {
        roles: &[Role::Admin],
        message: "需要管理员权限",
    };

    pub fn allows(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// 必须挂在 `auth_middleware` 之内
pub async fn require_role(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let role = req
        .extensions()
        .get::<CurrentUser>()
        .map(|user| user.role)
        .ok_or_else(|| AppError::Unauthorized("用户未登录".to_string()))?;

    if !gate.allows(role) {
        return Err(AppError::Forbidden(gate.message.to_string()));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gate_only_admits_admins() {
        assert!(RoleGate::ADMIN.allows(Role::Admin));
        assert!(!RoleGate::ADMIN.allows(Role::Teacher));
        assert!(!RoleGate::ADMIN.allows(Role::Student));
    }

    #[test]
    fn custom_gate_checks_membership() {
        let staff = RoleGate {
            roles: &[Role::Admin, Role::Teacher],
            message: "需要教师权限",
        };
        assert!(staff.allows(Role::Teacher));
        assert!(!staff.allows(Role::Student));
    }
}
