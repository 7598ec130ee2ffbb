use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::{self, Filter, Patch, UpdateSet, like_pattern};
use crate::validation::{Check, FieldRule, Mode, Validate};

/// 设备状态的唯一取值集合
pub const EQUIPMENT_STATUSES: &[&str] = &["available", "in_use", "maintenance", "inactive"];

const SELECT_WITH_LAB: &str = "SELECT e.*, l.code AS lab_code, l.name AS lab_name \
                               FROM equipment e LEFT JOIN labs l ON e.lab_id = l.id";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Equipment {
    pub id: i64,
    pub lab_id: i64,
    pub name: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub quantity: i32,
    pub students_per_group: i32,
    pub status: String,
    pub description: Option<String>,
    pub specifications: Option<String>,
    pub created_at: DateTime<Utc>,
    pub lab_code: Option<String>,
    pub lab_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EquipmentStats {
    pub total_equipment: i64,
    pub available_count: i64,
    pub in_use_count: i64,
    pub maintenance_count: i64,
    pub inactive_count: i64,
    pub total_quantity: i64,
}

const NAME_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "设备名称不能为空"),
    (Check::MaxLen(100), "设备名称不能超过100个字符"),
];
const LAB_RULES: &[(Check, &str)] = &[
    (Check::NotEmpty, "所属实验室不能为空"),
    (Check::Int { min: Some(1), max: None }, "实验室ID必须是正整数"),
];
const MODEL_RULES: &[(Check, &str)] = &[(Check::MaxLen(100), "设备型号不能超过100个字符")];
const SERIAL_RULES: &[(Check, &str)] = &[(Check::MaxLen(100), "序列号不能超过100个字符")];
const CATEGORY_RULES: &[(Check, &str)] = &[(Check::MaxLen(50), "设备类别不能超过50个字符")];
const MANUFACTURER_RULES: &[(Check, &str)] =
    &[(Check::MaxLen(100), "生产厂家不能超过100个字符")];
const DATE_RULES: &[(Check, &str)] = &[(Check::Date, "购买日期格式无效，应为YYYY-MM-DD")];
const PRICE_RULES: &[(Check, &str)] =
    &[(Check::Number { min: Some(0.0) }, "购买价格必须是非负数")];
const QUANTITY_RULES: &[(Check, &str)] = &[(
    Check::Int { min: Some(1), max: Some(i32::MAX as i64) },
    "设备数量必须是正整数",
)];
const GROUP_RULES: &[(Check, &str)] = &[(
    Check::Int { min: Some(1), max: Some(i32::MAX as i64) },
    "每组人数必须是正整数",
)];
const STATUS_RULES: &[(Check, &str)] = &[(
    Check::OneOf(EQUIPMENT_STATUSES),
    "设备状态必须是available、in_use、maintenance或inactive",
)];
const DESCRIPTION_RULES: &[(Check, &str)] = &[(Check::MaxLen(500), "描述不能超过500个字符")];
const SPECIFICATION_RULES: &[(Check, &str)] =
    &[(Check::MaxLen(1000), "技术规格不能超过1000个字符")];

#[derive(Debug, Deserialize)]
pub struct CreateEquipmentRequest {
    pub lab_id: i64,
    pub name: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub quantity: Option<i32>,
    pub students_per_group: Option<i32>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub specifications: Option<String>,
}

impl Validate for CreateEquipmentRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("name", NAME_RULES),
        FieldRule::required("lab_id", LAB_RULES),
        FieldRule::optional("model", MODEL_RULES),
        FieldRule::optional("serial_number", SERIAL_RULES),
        FieldRule::optional("category", CATEGORY_RULES),
        FieldRule::optional("manufacturer", MANUFACTURER_RULES),
        FieldRule::optional("purchase_date", DATE_RULES),
        FieldRule::optional("purchase_price", PRICE_RULES),
        FieldRule::defaulted("quantity", QUANTITY_RULES),
        FieldRule::defaulted("students_per_group", GROUP_RULES),
        FieldRule::defaulted("status", STATUS_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
        FieldRule::optional("specifications", SPECIFICATION_RULES),
    ];
    const MODE: Mode = Mode::Create;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateEquipmentRequest {
    pub lab_id: Patch<i64>,
    pub name: Patch<String>,
    pub model: Patch<String>,
    pub serial_number: Patch<String>,
    pub category: Patch<String>,
    pub manufacturer: Patch<String>,
    pub purchase_date: Patch<NaiveDate>,
    pub purchase_price: Patch<f64>,
    pub quantity: Patch<i32>,
    pub students_per_group: Patch<i32>,
    pub status: Patch<String>,
    pub description: Patch<String>,
    pub specifications: Patch<String>,
}

impl Validate for UpdateEquipmentRequest {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("name", NAME_RULES),
        FieldRule::required("lab_id", LAB_RULES),
        FieldRule::optional("model", MODEL_RULES),
        FieldRule::optional("serial_number", SERIAL_RULES),
        FieldRule::optional("category", CATEGORY_RULES),
        FieldRule::optional("manufacturer", MANUFACTURER_RULES),
        FieldRule::optional("purchase_date", DATE_RULES),
        FieldRule::optional("purchase_price", PRICE_RULES),
        FieldRule::defaulted("quantity", QUANTITY_RULES),
        FieldRule::defaulted("students_per_group", GROUP_RULES),
        FieldRule::defaulted("status", STATUS_RULES),
        FieldRule::optional("description", DESCRIPTION_RULES),
        FieldRule::optional("specifications", SPECIFICATION_RULES),
    ];
    const MODE: Mode = Mode::Update;
}

#[derive(Debug, Default, Deserialize)]
pub struct EquipmentFilter {
    pub lab_id: Option<i64>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl Equipment {
    pub async fn create(pool: &PgPool, req: CreateEquipmentRequest) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO equipment (lab_id, name, model, serial_number, category, manufacturer,
                                   purchase_date, purchase_price, quantity, students_per_group,
                                   status, description, specifications)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(req.lab_id)
        .bind(&req.name)
        .bind(&req.model)
        .bind(&req.serial_number)
        .bind(&req.category)
        .bind(&req.manufacturer)
        .bind(req.purchase_date)
        .bind(req.purchase_price)
        .bind(req.quantity.unwrap_or(1))
        .bind(req.students_per_group.unwrap_or(1))
        .bind(req.status.as_deref().unwrap_or("available"))
        .bind(&req.description)
        .bind(&req.specifications)
        .fetch_one(pool)
        .await?;

        tracing::debug!("Created equipment {} in lab {} ({})", req.name, req.lab_id, id);
        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Equipment>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(&format!("{} WHERE e.id = $1", SELECT_WITH_LAB))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_serial_number(
        pool: &PgPool,
        serial_number: &str,
    ) -> Result<Option<Equipment>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(&format!("{} WHERE e.serial_number = $1", SELECT_WITH_LAB))
            .bind(serial_number)
            .fetch_optional(pool)
            .await
    }

    /// 各条件之间为 AND 关系
    pub async fn list(pool: &PgPool, filter: EquipmentFilter) -> Result<Vec<Equipment>, sqlx::Error> {
        let mut query = Filter::new(SELECT_WITH_LAB);
        query
            .eq("e.lab_id", filter.lab_id)
            .eq("e.category", filter.category)
            .eq("e.status", filter.status);
        query
            .finish("ORDER BY e.created_at DESC")
            .build_query_as::<Equipment>()
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_lab(pool: &PgPool, lab_id: i64) -> Result<Vec<Equipment>, sqlx::Error> {
        Self::list(
            pool,
            EquipmentFilter {
                lab_id: Some(lab_id),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn list_available(pool: &PgPool) -> Result<Vec<Equipment>, sqlx::Error> {
        Self::list(
            pool,
            EquipmentFilter {
                status: Some("available".to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// 按设备名称、所属实验室编号和名称模糊搜索
    pub async fn search(pool: &PgPool, keyword: &str) -> Result<Vec<Equipment>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(&format!(
            "{} WHERE e.name ILIKE $1 OR l.code ILIKE $1 OR l.name ILIKE $1 ORDER BY e.created_at DESC",
            SELECT_WITH_LAB
        ))
        .bind(like_pattern(keyword))
        .fetch_all(pool)
        .await
    }

    pub async fn stats(pool: &PgPool) -> Result<EquipmentStats, sqlx::Error> {
        sqlx::query_as::<_, EquipmentStats>(
            r#"
            SELECT
                COUNT(*) AS total_equipment,
                COUNT(*) FILTER (WHERE status = 'available') AS available_count,
                COUNT(*) FILTER (WHERE status = 'in_use') AS in_use_count,
                COUNT(*) FILTER (WHERE status = 'maintenance') AS maintenance_count,
                COUNT(*) FILTER (WHERE status = 'inactive') AS inactive_count,
                COALESCE(SUM(quantity), 0)::BIGINT AS total_quantity
            FROM equipment
            "#,
        )
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        req: UpdateEquipmentRequest,
    ) -> Result<bool, sqlx::Error> {
        let mut set = UpdateSet::new("equipment");
        set.set("lab_id", req.lab_id)
            .set("name", req.name)
            .set("model", req.model)
            .set("serial_number", req.serial_number)
            .set("category", req.category)
            .set("manufacturer", req.manufacturer)
            .set("purchase_date", req.purchase_date)
            .set("purchase_price", req.purchase_price)
            .set("quantity", req.quantity)
            .set("students_per_group", req.students_per_group)
            .set("status", req.status)
            .set("description", req.description)
            .set("specifications", req.specifications);

        let Some(mut query) = set.into_query(id) else {
            return Ok(false);
        };
        let result = query.build().execute(pool).await?;
        Ok(database::affected(&result))
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(database::affected(&result))
    }
}
