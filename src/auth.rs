//! Credential handling: Argon2 password hashes, signed JWTs, and the
//! `AuthUser` extractor that turns a request token into an [`OwnerId`].

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApiError;
use crate::model::user::OwnerId;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: OwnerId,
    pub iat: i64,
    pub exp: i64,
}

pub struct Credentials {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl Credentials {
    pub fn new(secret: &[u8], token_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            token_ttl: Duration::seconds(token_ttl_secs),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
    }

    /// `Ok(false)` on a mismatch; `Err` only when the stored hash is unreadable.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ApiError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| ApiError::Internal(format!("stored password hash is invalid: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    pub fn issue_token(&self, owner: OwnerId) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: owner,
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<OwnerId, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                warn!("❌ Rejected token: {}", e);
                ApiError::Unauthorized("Token is not valid".into())
            })
    }
}

/// Ambil token dari header `x-auth-token` atau `Authorization: Bearer ...`
fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get("x-auth-token").and_then(|h| h.to_str().ok()) {
        return Some(token.trim());
    }

    headers
        .get("authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
}

/// The authenticated account behind a request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub OwnerId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("application state is not installed".into()))?;

        let token = token_from_headers(&parts.headers)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("No token, authorization denied".into()))?;

        let owner = state.credentials.verify_token(token)?;

        // Token dari akun yang sudah dihapus tidak berlaku lagi
        if state.stores.users.get(owner).await?.is_none() {
            warn!("❌ Token for deleted account {}", owner);
            return Err(ApiError::Unauthorized("Token is not valid".into()));
        }

        Ok(AuthUser(owner))
    }
}
