use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::{self, Patch, UpdateSet, like_pattern};
use crate::validation::{Check, FieldRule, Mode, Validate};

pub const COURSE_TYPES: &[&str] = &["theory", "lab", "mixed"];
pub const DEFAULT_COURSE_TYPE: &str = "mixed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub credit: i32,
    pub total_hours: i32,
    pub department: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub course_type: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

const CODE_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "课程代码不能为空"),
    (Check::MaxLen(20), "课程代码不能超过20个字符"),
];
const NAME_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "课程名称不能为空"),
    (Check::MaxLen(100), "课程名称不能超过100个字符"),
];
const CREDIT_RULES: &[(Check, &str)] = &[(
    Check::Int { min: Some(0), max: Some(10) },
    "学分必须是0-10之间的整数",
)];
const HOURS_RULES: &[(Check, &str)] = &[(
    Check::Int { min: Some(1), max: Some(200) },
    "总学时必须是1-200之间的整数",
)];
const DEPARTMENT_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "开课院系不能为空"),
    (Check::MaxLen(50), "开课院系不能超过50个字符"),
];
const TYPE_RULES: &[(Check, &str)] = &[(
    Check::OneOf(COURSE_TYPES),
    "课程类型必须是theory、lab或mixed",
)];
const DESCRIPTION_RULES: &[(Check, &str)] =
    &[(Check::MaxLen(500), "课程描述不能超过500个字符")];

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub code: String,
    pub name: String,
    pub credit: i32,
    pub total_hours: i32,
    pub department: String,
    #[serde(rename = "type")]
    pub course_type: Option<String>,
    pub description: Option<String>,
}

impl Validate for CreateCourseRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("code", CODE_RULES),
        FieldRule::required("name", NAME_RULES),
        FieldRule::required("credit", CREDIT_RULES),
        FieldRule::required("total_hours", HOURS_RULES),
        FieldRule::required("department", DEPARTMENT_RULES),
        FieldRule::defaulted("type", TYPE_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
    ];
    const MODE: Mode = Mode::Create;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCourseRequest {
    pub code: Patch<String>,
    pub name: Patch<String>,
    pub credit: Patch<i32>,
    pub total_hours: Patch<i32>,
    pub department: Patch<String>,
    #[serde(rename = "type")]
    pub course_type: Patch<String>,
    pub description: Patch<String>,
}

impl Validate for UpdateCourseRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("code", CODE_RULES),
        FieldRule::required("name", NAME_RULES),
        FieldRule::required("credit", CREDIT_RULES),
        FieldRule::required("total_hours", HOURS_RULES),
        FieldRule::required("department", DEPARTMENT_RULES),
        FieldRule::defaulted("type", TYPE_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
    ];
    const MODE: Mode = Mode::Update;
}

impl Course {
    pub async fn create(pool: &PgPool, req: CreateCourseRequest) -> Result<i64, sqlx::Error> {
        let course_type = req
            .course_type
            .unwrap_or_else(|| DEFAULT_COURSE_TYPE.to_string());

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO courses (code, name, credit, total_hours, department, type, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&req.code)
        .bind(&req.name)
        .bind(req.credit)
        .bind(req.total_hours)
        .bind(&req.department)
        .bind(&course_type)
        .bind(&req.description)
        .fetch_one(pool)
        .await?;

        tracing::debug!("Created course {} ({})", req.code, id);
        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    /// 按课程代码、名称、院系模糊搜索
    pub async fn search(pool: &PgPool, keyword: &str) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE code ILIKE $1 OR name ILIKE $1 OR department ILIKE $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(like_pattern(keyword))
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        req: UpdateCourseRequest,
    ) -> Result<bool, sqlx::Error> {
        let mut set = UpdateSet::new("courses");
        set.set("code", req.code)
            .set("name", req.name)
            .set("credit", req.credit)
            .set("total_hours", req.total_hours)
            .set("department", req.department)
            .set("type", req.course_type)
            .set("description", req.description);

        let Some(mut query) = set.into_query(id) else {
            return Ok(false);
        };
        let result = query.build().execute(pool).await?;
        Ok(database::affected(&result))
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(database::affected(&result))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::validation::validate;

    fn check<T: Validate>(body: serde_json::Value) -> Vec<String> {
        let map = body.as_object().cloned().unwrap_or_default();
        validate(T::RULES, &map, T::MODE)
            .into_iter()
            .map(|e| e.field)
            .collect()
    }

    #[test]
    fn minimal_course_is_accepted_and_defaults_type() {
        let body = json!({
            "code": "CS101",
            "name": "Intro",
            "credit": 3,
            "total_hours": 48,
            "department": "CS"
        });
        assert!(check::<CreateCourseRequest>(body.clone()).is_empty());

        let req: CreateCourseRequest = serde_json::from_value(body).unwrap();
        assert!(req.course_type.is_none());
    }

    #[test]
    fn course_bounds_are_enforced() {
        let fields = check::<CreateCourseRequest>(json!({
            "code": "CS101",
            "name": "Intro",
            "credit": 11,
            "total_hours": 0,
            "department": "",
            "type": "seminar"
        }));
        assert_eq!(fields, vec!["credit", "total_hours", "department", "type"]);
    }

    #[test]
    fn update_accepts_partial_body() {
        assert!(check::<UpdateCourseRequest>(json!({"name": "Advanced"})).is_empty());
        assert_eq!(check::<UpdateCourseRequest>(json!({"code": null})), vec!["code"]);

        let req: UpdateCourseRequest =
            serde_json::from_value(json!({"type": "lab", "description": null})).unwrap();
        assert_eq!(req.course_type, Patch::Value("lab".to_string()));
        assert_eq!(req.description, Patch::Null);
        assert_eq!(req.code, Patch::Absent);
    }
}
