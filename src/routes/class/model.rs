use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::{self, Filter, Patch, UpdateSet, like_pattern};
use crate::validation::{Check, FieldRule, Mode, Validate};

pub const CLASS_STATUSES: &[&str] = &["active", "graduated", "inactive"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub department: String,
    pub major: String,
    pub grade: String,
    pub class_number: String,
    pub student_count: i32,
    pub head_teacher: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DepartmentStat {
    pub department: String,
    pub count: i64,
    #[serde(rename = "totalStudents")]
    pub total_students: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassStats {
    #[serde(rename = "totalClasses")]
    pub total_classes: i64,
    #[serde(rename = "totalStudents")]
    pub total_students: i64,
    #[serde(rename = "departmentStats")]
    pub department_stats: Vec<DepartmentStat>,
}

const NAME_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "班级名称不能为空"),
    (Check::MaxLen(100), "班级名称不能超过100个字符"),
];
const DEPARTMENT_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "院系不能为空"),
    (Check::MaxLen(50), "院系不能超过50个字符"),
];
const MAJOR_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "专业不能为空"),
    (Check::MaxLen(50), "专业不能超过50个字符"),
];
const GRADE_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "年级不能为空"),
    (Check::MaxLen(10), "年级不能超过10个字符"),
];
const NUMBER_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "班号不能为空"),
    (Check::MaxLen(10), "班号不能超过10个字符"),
];
const STUDENT_COUNT_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "学生人数不能为空"),
    (Check::Int { min: Some(1), max: Some(200) }, "学生人数必须是1-200之间的整数"),
];
const HEAD_TEACHER_RULES: &[(Check, &str)] = &[(Check::MaxLen(50), "班主任不能超过50个字符")];
const DESCRIPTION_RULES: &[(Check, &str)] = &[(Check::MaxLen(500), "描述不能超过500个字符")];
const STATUS_RULES: &[(Check, &str)] = &[(
    Check::OneOf(CLASS_STATUSES),
    "班级状态必须是active、graduated或inactive",
)];

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
    pub department: String,
    pub major: String,
    pub grade: String,
    pub class_number: String,
    pub student_count: i32,
    pub head_teacher: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl Validate for CreateClassRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("name", NAME_RULES),
        FieldRule::required("department", DEPARTMENT_RULES),
        FieldRule::required("major", MAJOR_RULES),
        FieldRule::required("grade", GRADE_RULES),
        FieldRule::required("class_number", NUMBER_RULES),
        FieldRule::required("student_count", STUDENT_COUNT_RULES),
        FieldRule::optional("head_teacher", HEAD_TEACHER_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
        FieldRule::defaulted("status", STATUS_RULES),
    ];
    const MODE: Mode = Mode::Create;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateClassRequest {
    pub name: Patch<String>,
    pub department: Patch<String>,
    pub major: Patch<String>,
    pub grade: Patch<String>,
    pub class_number: Patch<String>,
    pub student_count: Patch<i32>,
    pub head_teacher: Patch<String>,
    pub description: Patch<String>,
    pub status: Patch<String>,
}

impl Validate for UpdateClassRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("name", NAME_RULES),
        FieldRule::required("department", DEPARTMENT_RULES),
        FieldRule::required("major", MAJOR_RULES),
        FieldRule::required("grade", GRADE_RULES),
        FieldRule::required("class_number", NUMBER_RULES),
        FieldRule::required("student_count", STUDENT_COUNT_RULES),
        FieldRule::optional("head_teacher", HEAD_TEACHER_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
        FieldRule::defaulted("status", STATUS_RULES),
    ];
    const MODE: Mode = Mode::Update;
}

impl UpdateClassRequest {
    /// 合并更新后的 (专业, 年级, 班号)，三者都未出现时返回 None
    pub fn merged_key(&self, current: &Class) -> Option<(String, String, String)> {
        if !self.major.is_present() && !self.grade.is_present() && !self.class_number.is_present()
        {
            return None;
        }
        let pick = |patch: &Patch<String>, fallback: &String| {
            patch.value().unwrap_or(fallback).clone()
        };
        Some((
            pick(&self.major, &current.major),
            pick(&self.grade, &current.grade),
            pick(&self.class_number, &current.class_number),
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassFilter {
    pub department: Option<String>,
    pub major: Option<String>,
    pub grade: Option<String>,
    pub status: Option<String>,
}

impl Class {
    pub async fn create(pool: &PgPool, req: CreateClassRequest) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO classes (name, department, major, grade, class_number,
                                 student_count, head_teacher, description, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&req.name)
        .bind(&req.department)
        .bind(&req.major)
        .bind(&req.grade)
        .bind(&req.class_number)
        .bind(req.student_count)
        .bind(&req.head_teacher)
        .bind(&req.description)
        .bind(req.status.as_deref().unwrap_or("active"))
        .fetch_one(pool)
        .await?;

        tracing::debug!("Created class {} ({})", req.name, id);
        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Class>, sqlx::Error> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_key(
        pool: &PgPool,
        major: &str,
        grade: &str,
        class_number: &str,
    ) -> Result<Option<Class>, sqlx::Error> {
        sqlx::query_as::<_, Class>(
            "SELECT * FROM classes WHERE major = $1 AND grade = $2 AND class_number = $3",
        )
        .bind(major)
        .bind(grade)
        .bind(class_number)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, filter: ClassFilter) -> Result<Vec<Class>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM classes");
        query
            .eq("department", filter.department)
            .eq("major", filter.major)
            .eq("grade", filter.grade)
            .eq("status", filter.status);
        query
            .finish("ORDER BY grade DESC, major, class_number")
            .build_query_as::<Class>()
            .fetch_all(pool)
            .await
    }

    /// 按班级名称、专业、院系模糊搜索
    pub async fn search(pool: &PgPool, keyword: &str) -> Result<Vec<Class>, sqlx::Error> {
        sqlx::query_as::<_, Class>(
            r#"
            SELECT * FROM classes
            WHERE name ILIKE $1 OR major ILIKE $1 OR department ILIKE $1
            ORDER BY grade DESC, major, class_number
            "#,
        )
        .bind(like_pattern(keyword))
        .fetch_all(pool)
        .await
    }

    pub async fn stats(pool: &PgPool) -> Result<ClassStats, sqlx::Error> {
        let (total_classes, total_students): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(student_count), 0)::BIGINT FROM classes",
        )
        .fetch_one(pool)
        .await?;

        let department_stats = sqlx::query_as::<_, DepartmentStat>(
            r#"
            SELECT department,
                   COUNT(*) AS count,
                   COALESCE(SUM(student_count), 0)::BIGINT AS total_students
            FROM classes
            GROUP BY department
            ORDER BY department
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(ClassStats {
            total_classes,
            total_students,
            department_stats,
        })
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        req: UpdateClassRequest,
    ) -> Result<bool, sqlx::Error> {
        let mut set = UpdateSet::new("classes");
        set.set("name", req.name)
            .set("department", req.department)
            .set("major", req.major)
            .set("grade", req.grade)
            .set("class_number", req.class_number)
            .set("student_count", req.student_count)
            .set("head_teacher", req.head_teacher)
            .set("description", req.description)
            .set("status", req.status);

        let Some(mut query) = set.into_query(id) else {
            return Ok(false);
        };
        let result = query.build().execute(pool).await?;
        Ok(database::affected(&result))
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(database::affected(&result))
    }
}
