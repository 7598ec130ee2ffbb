use axum::{Json, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::validation::FieldError;

/// 统一响应信封，前端只需判断 `success` 再读取 `message`/`error`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// 列表接口返回的记录条数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// 机器可读的错误码
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            total: None,
            error: None,
            errors: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        message: impl Into<String>,
        code: &str,
        errors: Option<Vec<FieldError>>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            total: None,
            error: Some(code.to_string()),
            errors,
            timestamp: Utc::now(),
        }
    }
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

pub fn ok<T>(message: &str, data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(message, Some(data)))))
}

pub fn created<T>(message: &str, data: T) -> ApiResult<T> {
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(message, Some(data))),
    ))
}

pub fn list<T>(message: &str, rows: Vec<T>) -> ApiResult<Vec<T>> {
    let mut body = ApiResponse::success(message, None);
    body.total = Some(rows.len());
    body.data = Some(rows);
    Ok((StatusCode::OK, Json(body)))
}

/// 无数据体的成功响应，例如删除
pub fn done(message: &str) -> ApiResult<()> {
    Ok((StatusCode::OK, Json(ApiResponse::success(message, None))))
}

/// 分页数据
#[derive(Debug, Serialize, Deserialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl<T> Paged<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }
}
