use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::{self, Filter, Patch, UpdateSet};
use crate::utils::Pagination;
use crate::validation::{Check, FieldRule, Mode, Validate};

const NAME_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "教师姓名不能为空"),
    (Check::MaxLen(100), "教师姓名不能超过100个字符"),
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Teacher {
    pub id: i64,
    pub teacher_id: String,
    pub name: String,
    pub department: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 下拉框使用的精简信息
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TeacherOption {
    pub id: i64,
    pub teacher_id: String,
    pub name: String,
    pub department: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeacherRequest {
    pub teacher_id: String,
    pub name: String,
    pub department: Option<String>,
    pub title: Option<String>,
}

impl Validate for CreateTeacherRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required(
            "teacher_id",
            &[
                (Check::NotEmpty, "教师工号不能为空"),
                (Check::MinLen(3), "教师工号长度至少3位"),
                (Check::MaxLen(50), "教师工号不能超过50个字符"),
            ],
        ),
        FieldRule::required("name", NAME_RULES),
        FieldRule::optional("department", &[(Check::MaxLen(255), "院系名称不能超过255个字符")]),
        FieldRule::optional("title", &[(Check::MaxLen(50), "职称不能超过50个字符")]),
    ];
    const MODE: Mode = Mode::Create;
}

/// 工号创建后不可修改，请求体中的 teacher_id 会被忽略
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTeacherRequest {
    pub name: Patch<String>,
    pub department: Patch<String>,
    pub title: Patch<String>,
}

impl Validate for UpdateTeacherRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("name", NAME_RULES),
        FieldRule::optional("department", &[(Check::MaxLen(255), "院系名称不能超过255个字符")]),
        FieldRule::optional("title", &[(Check::MaxLen(50), "职称不能超过50个字符")]),
    ];
    const MODE: Mode = Mode::Update;
}

#[derive(Debug, Default, Deserialize)]
pub struct TeacherListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub department: Option<String>,
}

impl Teacher {
    pub async fn create(pool: &PgPool, req: CreateTeacherRequest) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO teachers (teacher_id, name, department, title) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&req.teacher_id)
        .bind(&req.name)
        .bind(&req.department)
        .bind(&req.title)
        .fetch_one(pool)
        .await?;

        tracing::debug!("Created teacher {} ({})", req.teacher_id, id);
        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Teacher>, sqlx::Error> {
        sqlx::query_as::<_, Teacher>("SELECT * FROM teachers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_teacher_id(
        pool: &PgPool,
        teacher_id: &str,
    ) -> Result<Option<Teacher>, sqlx::Error> {
        sqlx::query_as::<_, Teacher>("SELECT * FROM teachers WHERE teacher_id = $1")
            .bind(teacher_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        page: Pagination,
        department: Option<&str>,
    ) -> Result<(Vec<Teacher>, i64), sqlx::Error> {
        let mut count = Filter::new("SELECT COUNT(*) FROM teachers");
        count.contains("department", department);
        let total = count
            .finish("")
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await?;

        let mut filter = Filter::new("SELECT * FROM teachers");
        filter.contains("department", department);
        let mut query = filter.finish("ORDER BY created_at DESC");
        query
            .push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
        let teachers = query.build_query_as::<Teacher>().fetch_all(pool).await?;

        Ok((teachers, total))
    }

    pub async fn list_options(pool: &PgPool) -> Result<Vec<TeacherOption>, sqlx::Error> {
        sqlx::query_as::<_, TeacherOption>(
            "SELECT id, teacher_id, name, department, title FROM teachers ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        req: UpdateTeacherRequest,
    ) -> Result<bool, sqlx::Error> {
        let mut set = UpdateSet::new("teachers");
        set.set("name", req.name)
            .set("department", req.department)
            .set("title", req.title);

        let Some(mut query) = set.into_query(id) else {
            return Ok(false);
        };
        let result = query.build().execute(pool).await?;
        Ok(database::affected(&result))
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teachers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(database::affected(&result))
    }
}
