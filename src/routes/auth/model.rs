use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::{self, Filter, Patch, UpdateSet};
use crate::utils::Pagination;
use crate::validation::{Check, FieldRule, Mode, Validate};

pub const ROLE_NAMES: &[&str] = &["admin", "teacher", "student"];

const NAME_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "姓名不能为空"),
    (Check::MaxLen(100), "姓名不能超过100个字符"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required(
            "username",
            &[
                (Check::NotEmpty, "用户名不能为空"),
                (Check::MaxLen(50), "用户名不能超过50个字符"),
            ],
        ),
        FieldRule::required(
            "password",
            &[
                (Check::NotEmpty, "密码不能为空"),
                (Check::MinLen(6), "密码长度至少6位"),
            ],
        ),
    ];
    const MODE: Mode = Mode::Create;
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

impl Validate for CreateUserRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required(
            "username",
            &[
                (Check::NotEmpty, "用户名不能为空"),
                (Check::MinLen(3), "用户名长度至少3位"),
                (Check::MaxLen(50), "用户名不能超过50个字符"),
            ],
        ),
        FieldRule::required(
            "password",
            &[
                (Check::NotEmpty, "密码不能为空"),
                (Check::MinLen(6), "密码长度至少6位"),
            ],
        ),
        FieldRule::required("name", NAME_RULES),
        FieldRule::required(
            "role",
            &[
                (Check::NotEmpty, "角色不能为空"),
                (Check::OneOf(ROLE_NAMES), "角色必须是admin、teacher或student"),
            ],
        ),
    ];
    const MODE: Mode = Mode::Create;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub name: Patch<String>,
    pub password: Patch<String>,
    pub role: Patch<String>,
}

impl Validate for UpdateUserRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("name", NAME_RULES),
        FieldRule::required(
            "password",
            &[
                (Check::NotEmpty, "密码不能为空"),
                (Check::MinLen(6), "密码长度至少6位"),
            ],
        ),
        FieldRule::required(
            "role",
            &[
                (Check::NotEmpty, "角色不能为空"),
                (Check::OneOf(ROLE_NAMES), "角色必须是admin、teacher或student"),
            ],
        ),
    ];
    const MODE: Mode = Mode::Update;
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub role: Option<String>,
}

/// 写入数据库的新用户，密码已哈希
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
}

/// 用户的可变字段
#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Patch<String>,
    pub password_hash: Patch<String>,
    pub role: Patch<String>,
}

impl User {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, user: NewUser) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, name, role) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.role)
        .fetch_one(pool)
        .await?;

        tracing::debug!("Created user {} ({})", user.username, id);
        Ok(id)
    }

    /// 没有任何字段时不发出语句，返回 false
    pub async fn update(pool: &PgPool, id: i64, changes: UserChanges) -> Result<bool, sqlx::Error> {
        let mut set = UpdateSet::new("users").touch("updated_at");
        set.set("name", changes.name)
            .set("password_hash", changes.password_hash)
            .set("role", changes.role);

        let Some(mut query) = set.into_query(id) else {
            return Ok(false);
        };
        let result = query.build().execute(pool).await?;
        Ok(database::affected(&result))
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(database::affected(&result))
    }

    /// 按创建时间倒序分页
    pub async fn list(
        pool: &PgPool,
        page: Pagination,
        role: Option<String>,
    ) -> Result<(Vec<User>, i64), sqlx::Error> {
        let mut count = Filter::new("SELECT COUNT(*) FROM users");
        count.eq("role", role.clone());
        let total: i64 = count.finish("").build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut filter = Filter::new("SELECT * FROM users");
        filter.eq("role", role);
        let mut query = filter.finish("ORDER BY created_at DESC");
        query
            .push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
        let users = query.build_query_as::<User>().fetch_all(pool).await?;

        Ok((users, total))
    }

    /// 系统中还没有管理员时创建默认管理员，返回新建的ID
    pub async fn bootstrap_admin(pool: &PgPool, admin: NewUser) -> Result<Option<i64>, sqlx::Error> {
        let mut tx = database::begin(pool).await?;

        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&mut *tx)
            .await?;
        if admins > 0 {
            database::rollback(tx).await?;
            return Ok(None);
        }

        // 同名普通用户已存在时不覆盖
        let id: Option<i64> = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, name, role) VALUES ($1, $2, $3, 'admin') \
             ON CONFLICT (username) DO NOTHING RETURNING id",
        )
        .bind(&admin.username)
        .bind(&admin.password_hash)
        .bind(&admin.name)
        .fetch_optional(&mut *tx)
        .await?;

        database::commit(tx).await?;
        Ok(id)
    }
}
