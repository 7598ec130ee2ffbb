use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::{self, Filter, Patch, UpdateSet, like_pattern};
use crate::validation::{Check, FieldRule, Mode, Validate};

pub const LAB_TYPES: &[&str] = &["general", "specialized", "research"];
pub const LAB_STATUSES: &[&str] = &["available", "maintenance", "inactive"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lab {
    pub id: i64,
    pub code: Option<String>,
    pub name: String,
    pub building_id: i64,
    pub building_name: Option<String>,
    pub room_number: Option<String>,
    pub room_capacity: i32,
    pub lab_type: String,
    pub equipment_count: i32,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

const NAME_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "实验室名称不能为空"),
    (Check::MaxLen(100), "实验室名称不能超过100个字符"),
];
const BUILDING_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "所属楼栋不能为空"),
    (Check::Int { min: Some(1), max: None }, "楼栋ID必须是正整数"),
];
const CODE_RULES: &[(Check, &str)] = &[(Check::MaxLen(20), "实验室编号不能超过20个字符")];
const BUILDING_NAME_RULES: &[(Check, &str)] =
    &[(Check::MaxLen(50), "楼栋名称不能超过50个字符")];
const ROOM_NUMBER_RULES: &[(Check, &str)] = &[(Check::MaxLen(20), "房间号不能超过20个字符")];
const CAPACITY_RULES: &[(Check, &str)] = &[(
    Check::Int { min: Some(1), max: Some(200) },
    "容纳人数必须是1-200之间的整数",
)];
const TYPE_RULES: &[(Check, &str)] = &[(
    Check::OneOf(LAB_TYPES),
    "实验室类型必须是general、specialized或research",
)];
const EQUIPMENT_COUNT_RULES: &[(Check, &str)] = &[(
    Check::Int { min: Some(0), max: Some(i32::MAX as i64) },
    "设备数量必须是非负整数",
)];
const STATUS_RULES: &[(Check, &str)] = &[(
    Check::OneOf(LAB_STATUSES),
    "状态必须是available、maintenance或inactive",
)];
const DESCRIPTION_RULES: &[(Check, &str)] = &[(Check::MaxLen(500), "描述不能超过500个字符")];

#[derive(Debug, Deserialize)]
pub struct CreateLabRequest {
    pub code: Option<String>,
    pub name: String,
    pub building_id: i64,
    pub building_name: Option<String>,
    pub room_number: Option<String>,
    pub room_capacity: Option<i32>,
    pub lab_type: Option<String>,
    pub equipment_count: Option<i32>,
    pub status: Option<String>,
    pub description: Option<String>,
}

impl Validate for CreateLabRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("name", NAME_RULES),
        FieldRule::required("building_id", BUILDING_RULES),
        FieldRule::optional("code", CODE_RULES),
        FieldRule::optional("building_name", BUILDING_NAME_RULES),
        FieldRule::optional("room_number", ROOM_NUMBER_RULES),
        FieldRule::defaulted("room_capacity", CAPACITY_RULES),
        FieldRule::defaulted("lab_type", TYPE_RULES),
        FieldRule::defaulted("equipment_count", EQUIPMENT_COUNT_RULES),
        FieldRule::defaulted("status", STATUS_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
    ];
    const MODE: Mode = Mode::Create;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateLabRequest {
    pub code: Patch<String>,
    pub name: Patch<String>,
    pub building_id: Patch<i64>,
    pub building_name: Patch<String>,
    pub room_number: Patch<String>,
    pub room_capacity: Patch<i32>,
    pub lab_type: Patch<String>,
    pub equipment_count: Patch<i32>,
    pub status: Patch<String>,
    pub description: Patch<String>,
}

impl Validate for UpdateLabRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("name", NAME_RULES),
        FieldRule::required("building_id", BUILDING_RULES),
        FieldRule::optional("code", CODE_RULES),
        FieldRule::optional("building_name", BUILDING_NAME_RULES),
        FieldRule::optional("room_number", ROOM_NUMBER_RULES),
        FieldRule::defaulted("room_capacity", CAPACITY_RULES),
        FieldRule::defaulted("lab_type", TYPE_RULES),
        FieldRule::defaulted("equipment_count", EQUIPMENT_COUNT_RULES),
        FieldRule::defaulted("status", STATUS_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
    ];
    const MODE: Mode = Mode::Update;
}

#[derive(Debug, Default, Deserialize)]
pub struct LabFilter {
    pub building_id: Option<i64>,
    pub lab_type: Option<String>,
    pub status: Option<String>,
}

impl Lab {
    pub async fn create(pool: &PgPool, req: CreateLabRequest) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO labs (code, name, building_id, building_name, room_number,
                              room_capacity, lab_type, equipment_count, status, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&req.code)
        .bind(&req.name)
        .bind(req.building_id)
        .bind(&req.building_name)
        .bind(&req.room_number)
        .bind(req.room_capacity.unwrap_or(100))
        .bind(req.lab_type.as_deref().unwrap_or("general"))
        .bind(req.equipment_count.unwrap_or(0))
        .bind(req.status.as_deref().unwrap_or("available"))
        .bind(&req.description)
        .fetch_one(pool)
        .await?;

        tracing::debug!("Created lab {} ({})", req.name, id);
        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Lab>, sqlx::Error> {
        sqlx::query_as::<_, Lab>("SELECT * FROM labs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Lab>, sqlx::Error> {
        sqlx::query_as::<_, Lab>("SELECT * FROM labs WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// 各条件之间为 AND 关系，未给出的条件不参与过滤
    pub async fn list(pool: &PgPool, filter: LabFilter) -> Result<Vec<Lab>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM labs");
        query
            .eq("building_id", filter.building_id)
            .eq("lab_type", filter.lab_type)
            .eq("status", filter.status);
        query
            .finish("ORDER BY created_at DESC")
            .build_query_as::<Lab>()
            .fetch_all(pool)
            .await
    }

    pub async fn list_available(pool: &PgPool) -> Result<Vec<Lab>, sqlx::Error> {
        sqlx::query_as::<_, Lab>("SELECT * FROM labs WHERE status = 'available' ORDER BY name")
            .fetch_all(pool)
            .await
    }

    /// 按编号、名称、楼栋名称、房间号模糊搜索
    pub async fn search(pool: &PgPool, keyword: &str) -> Result<Vec<Lab>, sqlx::Error> {
        sqlx::query_as::<_, Lab>(
            r#"
            SELECT * FROM labs
            WHERE code ILIKE $1 OR name ILIKE $1 OR building_name ILIKE $1 OR room_number ILIKE $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(like_pattern(keyword))
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: i64, req: UpdateLabRequest) -> Result<bool, sqlx::Error> {
        let mut set = UpdateSet::new("labs");
        set.set("code", req.code)
            .set("name", req.name)
            .set("building_id", req.building_id)
            .set("building_name", req.building_name)
            .set("room_number", req.room_number)
            .set("room_capacity", req.room_capacity)
            .set("lab_type", req.lab_type)
            .set("equipment_count", req.equipment_count)
            .set("status", req.status)
            .set("description", req.description);

        let Some(mut query) = set.into_query(id) else {
            return Ok(false);
        };
        let result = query.build().execute(pool).await?;
        Ok(database::affected(&result))
    }

    /// 仍有设备的实验室受外键保护，删除会失败
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM labs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(database::affected(&result))
    }
}
