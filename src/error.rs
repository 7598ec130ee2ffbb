use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

use crate::result::ApiResponse;
use crate::validation::FieldError;

pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("请求参数验证失败")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    /// 写入时触发唯一约束的错误转换为带业务消息的 409，其余保持为数据库错误
    pub fn unique_violation(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
        move |e| {
            let unique = e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation());
            if unique {
                tracing::warn!("Unique constraint violated on write: {}", e);
                AppError::Conflict(message.to_string())
            } else {
                AppError::Database(e)
            }
        }
    }

    /// 归一化为 (状态码, 错误码, 对外消息)，数据库与内部错误的细节只写日志
    pub fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                error_codes::VALIDATION_ERROR,
                self.to_string(),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, error_codes::BAD_REQUEST, msg.clone())
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, error_codes::UNAUTHORIZED, msg.clone())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, error_codes::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, error_codes::CONFLICT, msg.clone()),
            AppError::Token(e) => match e.kind() {
                ErrorKind::ExpiredSignature => (
                    StatusCode::UNAUTHORIZED,
                    error_codes::TOKEN_EXPIRED,
                    "令牌已过期".to_string(),
                ),
                _ => (
                    StatusCode::UNAUTHORIZED,
                    error_codes::INVALID_TOKEN,
                    "无效的令牌".to_string(),
                ),
            },
            AppError::Database(e) => classify_database_error(e),
            AppError::Password(e) => {
                tracing::error!("Password hashing failed: {}", e);
                internal()
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                internal()
            }
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_codes::INTERNAL_ERROR,
        "服务器内部错误".to_string(),
    )
}

fn classify_database_error(e: &sqlx::Error) -> (StatusCode, &'static str, String) {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            tracing::warn!("Unique constraint violated: {}", db_err);
            return (
                StatusCode::CONFLICT,
                error_codes::CONFLICT,
                "数据已存在，请检查重复项".to_string(),
            );
        }
        if db_err.is_foreign_key_violation() {
            tracing::warn!("Foreign key constraint violated: {}", db_err);
            return (
                StatusCode::BAD_REQUEST,
                error_codes::BAD_REQUEST,
                "数据关联错误".to_string(),
            );
        }
    }
    tracing::error!("Database error: {:?}", e);
    internal()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();
        let errors = match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        };

        let body = ApiResponse::<()>::failure(message, code, errors);
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::BadRequest("请求体格式错误".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::BadRequest("查询参数格式错误".to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

    use super::*;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct ExpClaims {
        exp: i64,
    }

    fn decode_error(exp: i64, secret: &[u8]) -> jsonwebtoken::errors::Error {
        let token = encode(
            &Header::default(),
            &ExpClaims { exp },
            &EncodingKey::from_secret(b"signing-secret"),
        )
        .unwrap();
        decode::<ExpClaims>(&token, &DecodingKey::from_secret(secret), &Validation::default())
            .err()
            .unwrap()
    }

    #[test]
    fn expired_and_invalid_tokens_have_distinct_messages() {
        let expired = AppError::Token(decode_error(
            Utc::now().timestamp() - 3_600,
            b"signing-secret",
        ));
        let (status, code, message) = expired.classify();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, error_codes::TOKEN_EXPIRED);
        assert_eq!(message, "令牌已过期");

        let tampered = AppError::Token(decode_error(
            Utc::now().timestamp() + 3_600,
            b"other-secret",
        ));
        let (status, code, message) = tampered.classify();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, error_codes::INVALID_TOKEN);
        assert_eq!(message, "无效的令牌");
    }

    #[test]
    fn unknown_database_errors_are_hidden() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        let (status, code, message) = err.classify();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, error_codes::INTERNAL_ERROR);
        assert_eq!(message, "服务器内部错误");
    }

    #[test]
    fn domain_errors_keep_their_message() {
        let (status, _, message) = AppError::conflict("课程代码已存在").classify();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message, "课程代码已存在");

        let (status, _, _) = AppError::not_found("课程不存在").classify();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, code, _) = AppError::Validation(vec![]).classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, error_codes::VALIDATION_ERROR);
    }

    #[test]
    fn non_unique_write_errors_stay_database_errors() {
        let err = AppError::unique_violation("课程代码已存在")(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }
}
