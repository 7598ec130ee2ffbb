use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::{self, Filter, Patch, UpdateSet, like_pattern};
use crate::routes::class::Class;
use crate::validation::{Check, FieldRule, Mode, Validate};

pub const SEMESTERS: &[&str] = &["spring", "summer", "fall"];
pub const OFFERING_STATUSES: &[&str] = &["active", "inactive", "completed"];
pub const ACTIVE: &str = "active";

const SELECT_DETAILED: &str = r#"
    SELECT co.*,
           c.code AS course_code, c.name AS course_name,
           c.credit AS course_credit, c.type AS course_type,
           t.name AS teacher_name, t.department AS teacher_department, t.title AS teacher_title,
           e.name AS equipment_name
    FROM course_offerings co
    LEFT JOIN courses c ON co.course_id = c.id
    LEFT JOIN teachers t ON co.teacher_id = t.id
    LEFT JOIN equipment e ON co.equipment_id = e.id"#;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseOffering {
    pub id: i64,
    pub course_id: i64,
    pub teacher_id: i64,
    pub equipment_id: Option<i64>,
    pub semester: String,
    pub academic_year: String,
    pub max_students: i32,
    pub lab_hours: i32,
    pub theory_hours: i32,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub course_credit: Option<i32>,
    pub course_type: Option<String>,
    pub teacher_name: Option<String>,
    pub teacher_department: Option<String>,
    pub teacher_title: Option<String>,
    pub equipment_name: Option<String>,
}

const COURSE_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "课程不能为空"),
    (Check::Int { min: Some(1), max: None }, "课程ID必须是正整数"),
];
const TEACHER_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "授课教师不能为空"),
    (Check::Int { min: Some(1), max: None }, "教师ID必须是正整数"),
];
const EQUIPMENT_RULES: &[(Check, &str)] = &[(
    Check::Int { min: Some(1), max: None },
    "设备ID必须是正整数",
)];
const SEMESTER_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "学期不能为空"),
    (Check::OneOf(SEMESTERS), "学期必须是spring、summer或fall"),
];
const YEAR_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "学年不能为空"),
    (Check::MaxLen(20), "学年不能超过20个字符"),
];
const MAX_STUDENTS_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "最大人数不能为空"),
    (Check::Int { min: Some(1), max: Some(200) }, "最大人数必须是1-200之间的整数"),
];
const LAB_HOURS_RULES: &[(Check, &str)] = &[(
    Check::Int { min: Some(0), max: Some(100) },
    "实验学时必须是0-100之间的整数",
)];
const THEORY_HOURS_RULES: &[(Check, &str)] = &[(
    Check::Int { min: Some(0), max: Some(100) },
    "理论学时必须是0-100之间的整数",
)];
const DESCRIPTION_RULES: &[(Check, &str)] = &[(Check::MaxLen(500), "描述不能超过500个字符")];
const STATUS_RULES: &[(Check, &str)] = &[(
    Check::OneOf(OFFERING_STATUSES),
    "开课状态必须是active、inactive或completed",
)];

#[derive(Debug, Deserialize)]
pub struct CreateOfferingRequest {
    pub course_id: i64,
    pub teacher_id: i64,
    pub equipment_id: Option<i64>,
    pub semester: String,
    pub academic_year: String,
    pub max_students: i32,
    pub lab_hours: Option<i32>,
    pub theory_hours: Option<i32>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl Validate for CreateOfferingRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("course_id", COURSE_RULES),
        FieldRule::required("teacher_id", TEACHER_RULES),
        FieldRule::optional("equipment_id", EQUIPMENT_RULES),
        FieldRule::required("semester", SEMESTER_RULES),
        FieldRule::required("academic_year", YEAR_RULES),
        FieldRule::required("max_students", MAX_STUDENTS_RULES),
        FieldRule::defaulted("lab_hours", LAB_HOURS_RULES),
        FieldRule::defaulted("theory_hours", THEORY_HOURS_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
        FieldRule::defaulted("status", STATUS_RULES),
    ];
    const MODE: Mode = Mode::Create;
}

impl CreateOfferingRequest {
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or(ACTIVE)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateOfferingRequest {
    pub course_id: Patch<i64>,
    pub teacher_id: Patch<i64>,
    pub equipment_id: Patch<i64>,
    pub semester: Patch<String>,
    pub academic_year: Patch<String>,
    pub max_students: Patch<i32>,
    pub lab_hours: Patch<i32>,
    pub theory_hours: Patch<i32>,
    pub description: Patch<String>,
    pub status: Patch<String>,
}

impl Validate for UpdateOfferingRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("course_id", COURSE_RULES),
        FieldRule::required("teacher_id", TEACHER_RULES),
        FieldRule::optional("equipment_id", EQUIPMENT_RULES),
        FieldRule::required("semester", SEMESTER_RULES),
        FieldRule::required("academic_year", YEAR_RULES),
        FieldRule::required("max_students", MAX_STUDENTS_RULES),
        FieldRule::defaulted("lab_hours", LAB_HOURS_RULES),
        FieldRule::defaulted("theory_hours", THEORY_HOURS_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
        FieldRule::defaulted("status", STATUS_RULES),
    ];
    const MODE: Mode = Mode::Update;
}

/// 更新后开课所在的学期
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub course_id: i64,
    pub semester: String,
    pub academic_year: String,
    pub status: String,
}

impl UpdateOfferingRequest {
    /// 课程、学期、学年、状态任一变化时返回合并后的学期，否则 None
    pub fn merged_term(&self, current: &CourseOffering) -> Option<Term> {
        if !self.course_id.is_present()
            && !self.semester.is_present()
            && !self.academic_year.is_present()
            && !self.status.is_present()
        {
            return None;
        }
        Some(Term {
            course_id: self.course_id.value().copied().unwrap_or(current.course_id),
            semester: self.semester.value().unwrap_or(&current.semester).clone(),
            academic_year: self
                .academic_year
                .value()
                .unwrap_or(&current.academic_year)
                .clone(),
            status: self.status.value().unwrap_or(&current.status).clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OfferingFilter {
    pub course_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddClassRequest {
    pub class_id: i64,
}

impl Validate for AddClassRequest {
    const RULES: &'static [FieldRule] = &[FieldRule::required(
        "class_id",
        &[
            (Check::NotEmpty, "班级ID不能为空"),
            (Check::Int { min: Some(1), max: None }, "班级ID必须是正整数"),
        ],
    )];
    const MODE: Mode = Mode::Create;
}

#[derive(Debug, Serialize)]
pub struct AssociationCreated {
    pub id: i64,
}

impl CourseOffering {
    pub async fn create(pool: &PgPool, req: CreateOfferingRequest) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO course_offerings (course_id, teacher_id, equipment_id, semester,
                                          academic_year, max_students, lab_hours, theory_hours,
                                          description, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(req.course_id)
        .bind(req.teacher_id)
        .bind(req.equipment_id)
        .bind(&req.semester)
        .bind(&req.academic_year)
        .bind(req.max_students)
        .bind(req.lab_hours.unwrap_or(0))
        .bind(req.theory_hours.unwrap_or(0))
        .bind(&req.description)
        .bind(req.status())
        .fetch_one(pool)
        .await?;

        tracing::debug!(
            "Created offering {} for course {} in {} {}",
            id,
            req.course_id,
            req.academic_year,
            req.semester
        );
        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<CourseOffering>, sqlx::Error> {
        sqlx::query_as::<_, CourseOffering>(&format!("{} WHERE co.id = $1", SELECT_DETAILED))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 查找同一课程在指定学期的有效开课
    pub async fn find_active_for_term(
        pool: &PgPool,
        course_id: i64,
        semester: &str,
        academic_year: &str,
    ) -> Result<Option<CourseOffering>, sqlx::Error> {
        sqlx::query_as::<_, CourseOffering>(&format!(
            "{} WHERE co.course_id = $1 AND co.semester = $2 AND co.academic_year = $3 AND co.status = 'active'",
            SELECT_DETAILED
        ))
        .bind(course_id)
        .bind(semester)
        .bind(academic_year)
        .fetch_optional(pool)
        .await
    }

    /// 各条件之间为 AND 关系
    pub async fn list(
        pool: &PgPool,
        filter: OfferingFilter,
    ) -> Result<Vec<CourseOffering>, sqlx::Error> {
        let mut query = Filter::new(SELECT_DETAILED);
        query
            .eq("co.course_id", filter.course_id)
            .eq("co.teacher_id", filter.teacher_id)
            .eq("co.semester", filter.semester)
            .eq("co.academic_year", filter.academic_year)
            .eq("co.status", filter.status);
        query
            .finish("ORDER BY co.academic_year DESC, co.semester, co.created_at DESC")
            .build_query_as::<CourseOffering>()
            .fetch_all(pool)
            .await
    }

    /// 按课程代码、课程名称、学期、教师姓名模糊搜索
    pub async fn search(pool: &PgPool, keyword: &str) -> Result<Vec<CourseOffering>, sqlx::Error> {
        sqlx::query_as::<_, CourseOffering>(&format!(
            "{} WHERE c.code ILIKE $1 OR c.name ILIKE $1 OR co.semester ILIKE $1 OR t.name ILIKE $1 \
             ORDER BY co.academic_year DESC, co.semester, co.created_at DESC",
            SELECT_DETAILED
        ))
        .bind(like_pattern(keyword))
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        req: UpdateOfferingRequest,
    ) -> Result<bool, sqlx::Error> {
        let mut set = UpdateSet::new("course_offerings");
        set.set("course_id", req.course_id)
            .set("teacher_id", req.teacher_id)
            .set("equipment_id", req.equipment_id)
            .set("semester", req.semester)
            .set("academic_year", req.academic_year)
            .set("max_students", req.max_students)
            .set("lab_hours", req.lab_hours)
            .set("theory_hours", req.theory_hours)
            .set("description", req.description)
            .set("status", req.status);

        let Some(mut query) = set.into_query(id) else {
            return Ok(false);
        };
        let result = query.build().execute(pool).await?;
        Ok(database::affected(&result))
    }

    /// 关联的班级记录随外键级联删除
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM course_offerings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(database::affected(&result))
    }

    pub async fn classes(pool: &PgPool, offering_id: i64) -> Result<Vec<Class>, sqlx::Error> {
        sqlx::query_as::<_, Class>(
            r#"
            SELECT cl.* FROM classes cl
            JOIN course_offering_classes coc ON coc.class_id = cl.id
            WHERE coc.course_offering_id = $1
            ORDER BY cl.grade DESC, cl.major, cl.class_number
            "#,
        )
        .bind(offering_id)
        .fetch_all(pool)
        .await
    }

    pub async fn has_class(pool: &PgPool, offering_id: i64, class_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM course_offering_classes WHERE course_offering_id = $1 AND class_id = $2)",
        )
        .bind(offering_id)
        .bind(class_id)
        .fetch_one(pool)
        .await
    }

    pub async fn add_class(pool: &PgPool, offering_id: i64, class_id: i64) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO course_offering_classes (course_offering_id, class_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(offering_id)
        .bind(class_id)
        .fetch_one(pool)
        .await?;

        tracing::debug!("Added class {} to offering {}", class_id, offering_id);
        Ok(id)
    }

    pub async fn remove_class(
        pool: &PgPool,
        offering_id: i64,
        class_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM course_offering_classes WHERE course_offering_id = $1 AND class_id = $2",
        )
        .bind(offering_id)
        .bind(class_id)
        .execute(pool)
        .await?;
        Ok(database::affected(&result))
    }
}
