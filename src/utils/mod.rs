use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

const HASH_COST: u32 = 10;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), HASH_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,         // 用户ID
    pub username: String, // 用户名
    pub role: String,     // 签发时的角色
    pub exp: i64,         // 过期时间
    pub iat: i64,         // 签发时间
}

pub fn generate_token(
    user_id: i64,
    username: &str,
    role: &str,
    config: &Config,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let lifetime = i64::try_from(config.jwt_expiration().as_secs()).unwrap_or(i64::MAX);
    let expiration = now.saturating_add(lifetime);

    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role: role.to_string(),
        exp: expiration,
        iat: now,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    Ok((token, expiration))
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// 路径参数中的数字ID
pub fn parse_id(raw: &str, message: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::bad_request(message))
}

/// 非空的搜索关键词
pub fn require_keyword(keyword: Option<&str>) -> Result<&str, AppError> {
    match keyword.map(str::trim) {
        Some(kw) if !kw.is_empty() => Ok(kw),
        _ => Err(AppError::bad_request("搜索关键词不能为空")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// 无法解析的参数回落到默认值，limit 限制在 1..=100，offset 饱和而不溢出
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(expires_in: &str) -> Config {
        Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some("unit-test-secret".to_string()),
            "JWT_EXPIRES_IN" => Some(expires_in.to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn token_round_trip_carries_identity() {
        let config = test_config("1h");
        let (token, exp) = generate_token(42, "alice", "teacher", &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "teacher");
        assert_eq!(claims.exp, exp);
        assert_eq!(claims.exp - claims.iat, 3_600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = generate_token(1, "a", "admin", &test_config("1h")).unwrap();
        let mut other = test_config("1h");
        other.jwt_secret = "someone-else".to_string();
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hashed = hash_password("secret123").unwrap();
        assert_ne!(hashed, "secret123");
        assert!(verify_password("secret123", &hashed).unwrap());
        assert!(!verify_password("wrong-pass", &hashed).unwrap());
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(
            Pagination::from_query(None, None),
            Pagination { page: 1, limit: 10, offset: 0 }
        );
        assert_eq!(
            Pagination::from_query(Some("3"), Some("20")),
            Pagination { page: 3, limit: 20, offset: 40 }
        );
        assert_eq!(Pagination::from_query(Some("0"), Some("500")).limit, 100);
        assert_eq!(Pagination::from_query(Some("abc"), Some("-5")).page, 1);
        assert_eq!(Pagination::from_query(Some("abc"), Some("-5")).limit, 1);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let page = Pagination::from_query(Some("9223372036854775807"), Some("10"));
        assert_eq!(page.page, i64::MAX);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset, i64::MAX);

        let page = Pagination::from_query(Some("9223372036854775807"), Some("1"));
        assert_eq!(page.offset, i64::MAX - 1);
    }

    #[test]
    fn unbounded_lifetime_caps_expiry() {
        let mut config = test_config("1h");
        config.jwt_expiration_secs = u64::MAX;
        let (_, exp) = generate_token(7, "bob", "student", &config).unwrap();
        assert_eq!(exp, i64::MAX);
    }

    #[test]
    fn ids_and_keywords() {
        assert_eq!(parse_id("12", "无效的ID参数").unwrap(), 12);
        assert!(parse_id("abc", "无效的ID参数").is_err());
        assert_eq!(require_keyword(Some("  CS ")).unwrap(), "CS");
        assert!(require_keyword(Some("   ")).is_err());
        assert!(require_keyword(None).is_err());
    }
}
