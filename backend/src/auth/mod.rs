//! # Authentication
//!
//! Password hashing and access tokens.
//!
//! ## Token Format
//!
//! HS256 JWT signed with `JWT_SECRET`:
//!
//! ```json
//! { "sub": "<user_id>", "role": "admin", "iat": 1714550400, "exp": 1714557600 }
//! ```
//!
//! A verified token becomes an [`AuthContext`], the only thing the
//! rest of the backend ever sees of the caller.

use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::Role;
use crate::services::ServiceError;

/// Errors raised while hashing or checking credentials.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    /// Bad signature, malformed or expired token.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing bearer token")]
    MissingToken,
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) | AuthError::MissingToken => {
                ServiceError::Unauthorized(err.to_string())
            }
            AuthError::Hashing(_) | AuthError::Encoding(_) => ServiceError::Internal(err.to_string()),
        }
    }
}

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("admin role required".to_string()))
        }
    }

    /// Allow the caller to act on `user_id`'s resources: their own, or
    /// anyone's for an admin.
    pub fn require_self_or_admin(&self, user_id: &str) -> Result<(), ServiceError> {
        if self.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "user {} may not access resources of user {}",
                self.user_id, user_id
            )))
        }
    }
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Sign a token for `user_id` valid for the configured lifetime.
    pub fn issue(&self, user_id: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Check signature and expiry and return the caller.
    pub fn verify(&self, token: &str) -> Result<AuthContext, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(AuthContext {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .unwrap_or_default();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Hash a password into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// `false` for a wrong password and for an unparseable stored hash alike.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter22").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[test]
    fn test_token_carries_user_and_role() {
        let issuer = TokenIssuer::new("secret", Duration::from_secs(7200));
        let token = issuer.issue("u1", Role::Admin).unwrap();

        let ctx = issuer.verify(&token).unwrap();
        assert_eq!(ctx.user_id, "u1");
        assert!(ctx.is_admin());
    }

    #[test]
    fn test_token_rejected_with_other_secret_or_expired() {
        let issuer = TokenIssuer::new("secret", Duration::from_secs(7200));
        let token = issuer.issue("u1", Role::User).unwrap();

        let other = TokenIssuer::new("other", Duration::from_secs(7200));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken(_))));

        let now = Utc::now().timestamp();
        let stale = Claims {
            sub: "u1".into(),
            role: Role::User,
            iat: now - 10_000,
            exp: now - 3_600,
        };
        let expired = encode(
            &Header::default(),
            &stale,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(issuer.verify(&expired).is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def").unwrap(), "abc.def");
        assert!(matches!(bearer_token("Bearer "), Err(AuthError::MissingToken)));
        assert!(bearer_token("Basic dXNlcg==").is_err());
    }

    #[test]
    fn test_role_checks() {
        let user = AuthContext {
            user_id: "u1".into(),
            role: Role::User,
        };
        assert!(user.require_self_or_admin("u1").is_ok());
        assert!(matches!(
            user.require_self_or_admin("u2"),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(user.require_admin().is_err());

        let admin = AuthContext {
            user_id: "a1".into(),
            role: Role::Admin,
        };
        assert!(admin.require_self_or_admin("u2").is_ok());
        assert!(admin.require_admin().is_ok());
    }
}
