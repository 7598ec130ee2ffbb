//! Declarative request-body rules and the `Validated` extractor.
//!
//! Each request type lists its rules once; the extractor checks the raw JSON
//! object against them before deserializing, so handlers only ever see bodies
//! that already passed field-level validation.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 新建：必填字段必须出现且不为 null
    Create,
    /// 部分更新：只校验出现的字段
    Update,
}

#[derive(Debug, Clone, Copy)]
pub enum Check {
    NotEmpty,
    MinLen(usize),
    MaxLen(usize),
    Int { min: Option<i64>, max: Option<i64> },
    Number { min: Option<f64> },
    OneOf(&'static [&'static str]),
    Date,
}

impl Check {
    /// 长度、枚举、日期检查只对字符串有意义
    fn expects_text(&self) -> bool {
        matches!(
            self,
            Check::MinLen(_) | Check::MaxLen(_) | Check::OneOf(_) | Check::Date
        )
    }
}

const TEXT_EXPECTED: &str = "字段类型错误，应为字符串";

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub nullable: bool,
    pub checks: &'static [(Check, &'static str)],
}

impl FieldRule {
    pub const fn required(field: &'static str, checks: &'static [(Check, &'static str)]) -> Self {
        Self {
            field,
            required: true,
            nullable: false,
            checks,
        }
    }

    pub const fn optional(field: &'static str, checks: &'static [(Check, &'static str)]) -> Self {
        Self {
            field,
            required: false,
            nullable: true,
            checks,
        }
    }

    /// 可省略（由数据库默认值填充），但不能显式置空
    pub const fn defaulted(field: &'static str, checks: &'static [(Check, &'static str)]) -> Self {
        Self {
            field,
            required: false,
            nullable: false,
            checks,
        }
    }

    fn expects_text(&self) -> bool {
        self.checks.iter().any(|(check, _)| check.expects_text())
    }

    fn missing_message(&self) -> String {
        self.checks
            .first()
            .map(|(_, msg)| msg.to_string())
            .unwrap_or_else(|| format!("{}不能为空", self.field))
    }
}

/// 请求体类型声明自己的校验规则
pub trait Validate {
    const RULES: &'static [FieldRule];
    const MODE: Mode;
}

pub fn validate(rules: &[FieldRule], body: &Map<String, Value>, mode: Mode) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for rule in rules {
        let value = body.get(rule.field);
        match value {
            None if mode == Mode::Create && rule.required => {
                errors.push(field_error(rule.field, rule.missing_message()));
            }
            None => {}
            Some(Value::Null) if !rule.nullable => {
                errors.push(field_error(rule.field, rule.missing_message()));
            }
            Some(Value::Null) => {}
            Some(v) if !v.is_string() && rule.expects_text() => {
                errors.push(field_error(rule.field, TEXT_EXPECTED.to_string()));
            }
            Some(v) => {
                if let Some((_, msg)) = rule.checks.iter().find(|(check, _)| !passes(check, v)) {
                    errors.push(field_error(rule.field, msg.to_string()));
                }
            }
        }
    }

    errors
}

fn field_error(field: &str, message: String) -> FieldError {
    FieldError {
        field: field.to_string(),
        message,
    }
}

fn passes(check: &Check, value: &Value) -> bool {
    match check {
        Check::NotEmpty => match value {
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        },
        Check::MinLen(min) => value.as_str().is_some_and(|s| s.chars().count() >= *min),
        Check::MaxLen(max) => value.as_str().is_some_and(|s| s.chars().count() <= *max),
        Check::Int { min, max } => value.as_i64().is_some_and(|n| {
            min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max)
        }),
        Check::Number { min } => value
            .as_f64()
            .is_some_and(|n| min.is_none_or(|min| n >= min)),
        Check::OneOf(allowed) => value.as_str().is_some_and(|s| allowed.contains(&s)),
        Check::Date => value
            .as_str()
            .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
    }
}

/// JSON 请求体提取器，格式错误统一转换为 400 信封
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// 查询参数提取器
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// 先按规则校验，再反序列化为目标类型
pub struct Validated<T>(pub T);

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(body) = AppJson::<Value>::from_request(req, state).await?;
        let Value::Object(map) = body else {
            return Err(AppError::bad_request("请求体必须是JSON对象"));
        };

        let errors = validate(T::RULES, &map, T::MODE);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let value = serde_json::from_value(Value::Object(map)).map_err(|e| {
            tracing::debug!("Validated body failed to deserialize: {}", e);
            AppError::bad_request("请求体格式错误")
        })?;
        Ok(Validated(value))
    }
}
