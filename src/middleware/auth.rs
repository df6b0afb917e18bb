use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{auth::Claims, error::AppError, models::Role, state::AppState};

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub uid: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub claims: Claims,
}

/// Who is behind a request. Requests without an `Authorization` header are
/// anonymous; a header carrying a bad or revoked token is rejected outright.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    Customer(SessionUser),
    Administrator(SessionUser),
}

impl Principal {
    pub fn from_claims(claims: Claims) -> Result<Self, AppError> {
        let uid = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;
        let role = claims.role;
        let user = SessionUser {
            uid,
            email: claims.email.clone(),
            phone: claims.phone.clone(),
            claims,
        };
        Ok(match role {
            Role::Customer => Principal::Customer(user),
            Role::Administrator => Principal::Administrator(user),
        })
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Principal::Anonymous => None,
            Principal::Customer(user) | Principal::Administrator(user) => Some(user),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Principal::Anonymous => None,
            Principal::Customer(_) => Some(Role::Customer),
            Principal::Administrator(_) => Some(Role::Administrator),
        }
    }
}

fn sign_in_required() -> AppError {
    AppError::Unauthorized("Please sign in to continue".into())
}

pub fn ensure_admin(principal: &Principal) -> Result<&SessionUser, AppError> {
    match principal {
        Principal::Administrator(user) => Ok(user),
        Principal::Customer(_) => Err(AppError::Forbidden),
        Principal::Anonymous => Err(sign_in_required()),
    }
}

pub fn ensure_customer(principal: &Principal) -> Result<&SessionUser, AppError> {
    match principal {
        Principal::Customer(user) => Ok(user),
        Principal::Administrator(_) => Err(AppError::Forbidden),
        Principal::Anonymous => Err(sign_in_required()),
    }
}

pub fn ensure_signed_in(principal: &Principal) -> Result<&SessionUser, AppError> {
    principal.user().ok_or_else(sign_in_required)
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Principal::Anonymous);
        };

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        let Some(token) = auth_str.strip_prefix("Bearer ") else {
            return Err(AppError::BadRequest("Invalid Authorization scheme".into()));
        };

        let claims = state.sessions.verify(token.trim())?;
        Principal::from_claims(claims)
    }
}
