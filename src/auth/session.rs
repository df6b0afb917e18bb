use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    /// Session id; revocation is keyed on it.
    pub sid: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub exp: usize,
}

/// Issues and checks HS256 session tokens.
pub struct SessionTokens {
    secret: String,
    ttl: Duration,
    /// Revoked session ids with their expiry, pruned once the token would be dead anyway.
    revoked: RwLock<HashMap<Uuid, i64>>,
}

impl SessionTokens {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            secret: secret.to_string(),
            ttl: Duration::hours(ttl_hours),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Returns `Bearer <jwt>`.
    pub fn issue(
        &self,
        uid: Uuid,
        role: Role,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<String, AppError> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: uid.to_string(),
            sid: Uuid::new_v4(),
            role,
            email,
            phone,
            exp: expiration.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

        Ok(format!("Bearer {}", token))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let revoked = self.revoked.read().unwrap_or_else(PoisonError::into_inner);
        if revoked.contains_key(&decoded.claims.sid) {
            return Err(AppError::Unauthorized("Session has been signed out".into()));
        }
        Ok(decoded.claims)
    }

    pub fn revoke(&self, claims: &Claims) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().unwrap_or_else(PoisonError::into_inner);
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(claims.sid, claims.exp as i64);
    }
}
