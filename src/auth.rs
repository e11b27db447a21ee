//! Credentials: bcrypt password hashes and HS256 bearer tokens.
//!
//! Tokens carry the user's id, username and email so that handlers can
//! identify the requester without a database round trip.

use anyhow::{Context, anyhow};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{LibError, Result};
use crate::models::{UserData, UserId};

/// Signing settings for bearer tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_secs: u64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, jwt_expiry_secs: u64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_expiry_secs,
        }
    }
}

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user(&self) -> Result<UserData> {
        let id: UserId = self.sub.parse().map_err(|err| {
            LibError::token_missing(anyhow!("token subject {:?} is not a user id: {}", self.sub, err))
        })?;
        Ok(UserData {
            id,
            username: self.username.clone(),
            email: self.email.clone(),
        })
    }
}

pub fn encode_token(user: &UserData, config: &AuthConfig) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let ttl = i64::try_from(config.jwt_expiry_secs).unwrap_or(i64::MAX);
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        iat: now,
        exp: now.saturating_add(ttl),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .context("Failed to encode JWT")
}

/// Decodes a token, rejecting bad signatures and expired claims.
pub fn decode_token(token: &str, config: &AuthConfig) -> anyhow::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT")?;
    Ok(data.claims)
}

/// Pulls the token out of an `Authorization` header value. The scheme is
/// matched case-insensitively.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|err| LibError::unknown("Failed to hash password", anyhow!(err)))?
        .map_err(|err| LibError::unknown("Failed to hash password", anyhow!(err)))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| LibError::unknown("Failed to verify password", anyhow!(err)))?
        .or_else(|err| {
            tracing::warn!(error = %err, "stored password hash is unreadable");
            Ok::<_, LibError>(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

    fn config() -> AuthConfig {
        AuthConfig::new(TEST_SECRET, 3600)
    }

    fn alice() -> UserData {
        UserData {
            id: UserId(7),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn token_carries_user_identity() {
        let token = encode_token(&alice(), &config()).expect("encode should succeed");
        let claims = decode_token(&token, &config()).expect("decode should succeed");
        assert_eq!(claims.user().unwrap(), alice());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "7".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(decode_token(&token, &config()).is_err());
    }

    #[test]
    fn oversized_expiry_saturates_instead_of_wrapping() {
        let config = AuthConfig::new(TEST_SECRET, u64::MAX);
        let token = encode_token(&alice(), &config).expect("encode should succeed");
        let claims = decode_token(&token, &config).expect("token must not be born expired");
        assert_eq!(claims.exp, i64::MAX);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = encode_token(&alice(), &config()).unwrap();
        let other = AuthConfig::new("wrong-secret-that-is-also-32chars!", 3600);
        assert!(decode_token(&token, &other).is_err());
    }

    #[test]
    fn non_numeric_subject_rejected() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            iat: 0,
            exp: 0,
        };
        assert!(claims.user().is_err());
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("bearer "), None);
        assert_eq!(bearer_token("abc.def"), None);
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hash = hash_password("hunter22".to_string()).await.unwrap();
        assert!(verify_password("hunter22".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("hunter23".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_does_not_verify() {
        assert!(
            !verify_password("hunter22".to_string(), "plain".to_string())
                .await
                .unwrap()
        );
    }
}
