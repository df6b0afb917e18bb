use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// An identity as the provider sees it. `uid` doubles as the `users` document id.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthAccount {
    pub uid: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub email_verified: bool,
}

/// Opaque reference to an outstanding phone confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfirmationHandle(pub String);

#[derive(Debug, Error)]
pub enum AuthProviderError {
    #[error("email already in use")]
    EmailAlreadyInUse,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unknown account {0}")]
    UnknownAccount(Uuid),

    #[error("invalid verification code")]
    InvalidCode,

    #[error("verification code expired")]
    CodeExpired,

    #[error("account store failure")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthAccount, AuthProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthAccount, AuthProviderError>;

    /// Sends the verification link for the account's email address.
    async fn send_email_verification(&self, uid: Uuid) -> Result<(), AuthProviderError>;

    async fn confirm_email_verification(&self, code: &str)
    -> Result<AuthAccount, AuthProviderError>;

    /// Sends a one-time code to `phone` (E.164) and returns the handle to confirm it with.
    async fn send_phone_code(&self, phone: &str) -> Result<ConfirmationHandle, AuthProviderError>;

    async fn confirm_phone_code(
        &self,
        handle: &ConfirmationHandle,
        code: &str,
    ) -> Result<AuthAccount, AuthProviderError>;

    /// Forgets an outstanding code so it can no longer be confirmed.
    async fn discard_phone_code(&self, _handle: &ConfirmationHandle) {}
}
