//! JWT 令牌服务
//!
//! Access and refresh tokens carry only the user id (`sub`). They are signed
//! with distinct secrets, so one class can never be replayed as the other.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// JWT 配置
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access token lifetime (minutes)
    pub access_expiration_minutes: i64,
    /// Refresh token lifetime (days)
    pub refresh_expiration_days: i64,
    pub issuer: String,
    pub audience: String,
}

impl From<&Config> for JwtConfig {
    fn from(config: &Config) -> Self {
        Self {
            access_secret: config.jwt_secret.clone(),
            refresh_secret: config.jwt_refresh_secret.clone(),
            access_expiration_minutes: config.jwt_expiration_minutes,
            refresh_expiration_days: config.jwt_refresh_expiration_days,
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
        }
    }
}

/// Token class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID (Subject)
    pub sub: String,
    pub token_type: TokenKind,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    ExpiredToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("wrong token type")]
    WrongTokenType,

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

/// Access + refresh pair issued on login / refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT 令牌服务
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    access: std::sync::Arc<KeyPair>,
    refresh: std::sync::Arc<KeyPair>,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let access = std::sync::Arc::new(KeyPair::from_secret(&config.access_secret));
        let refresh = std::sync::Arc::new(KeyPair::from_secret(&config.refresh_secret));
        Self {
            config,
            access,
            refresh,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => Duration::minutes(self.config.access_expiration_minutes),
            TokenKind::Refresh => Duration::days(self.config.refresh_expiration_days),
        }
    }

    /// Sign a token of the given class at `now`
    pub fn generate_at(
        &self,
        user_id: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user_id.to_string(),
            token_type: kind,
            exp: (now + self.lifetime(kind)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.keys(kind).encoding)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Issue a fresh access + refresh pair
    pub fn issue_pair(&self, user_id: &str) -> Result<TokenPair, JwtError> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.generate_at(user_id, TokenKind::Access, now)?,
            refresh_token: self.generate_at(user_id, TokenKind::Refresh, now)?,
            expires_in: self.lifetime(TokenKind::Access).num_seconds(),
        })
    }

    /// 验证并解码令牌
    pub fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.keys(kind).decoding, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                    ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    _ => JwtError::InvalidToken(e.to_string()),
                }
            })?;

        if token_data.claims.token_type != kind {
            return Err(JwtError::WrongTokenType);
        }
        Ok(token_data.claims)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig::from(&Config::development()))
    }

    #[test]
    fn test_access_token_round_trip() {
        let svc = service();
        let pair = svc.issue_pair("user-1").unwrap();
        let claims = svc.validate(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.token_type, TokenKind::Access);
        assert_eq!(pair.expires_in, 15 * 60);
    }

    #[test]
    fn test_token_classes_not_interchangeable() {
        let svc = service();
        let pair = svc.issue_pair("user-1").unwrap();
        assert!(matches!(
            svc.validate(&pair.refresh_token, TokenKind::Access),
            Err(JwtError::InvalidSignature)
        ));
        assert!(matches!(
            svc.validate(&pair.access_token, TokenKind::Refresh),
            Err(JwtError::InvalidSignature)
        ));
        assert!(svc.validate(&pair.refresh_token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let issued = Utc::now() - Duration::hours(2);
        let token = svc.generate_at("user-1", TokenKind::Access, issued).unwrap();
        assert!(matches!(
            svc.validate(&token, TokenKind::Access),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
    }
}
