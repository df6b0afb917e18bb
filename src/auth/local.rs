use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::provider::{AuthAccount, AuthProvider, AuthProviderError, ConfirmationHandle};
use crate::models::{from_document, to_document_data};
use crate::store::{AUTH_ACCOUNTS, DocumentQuery, DocumentStore};

/// In-process identity provider.
///
/// Accounts live in the `auth_accounts` collection of the document store with
/// argon2 password hashes. Verification links and one-time codes are handed
/// to the log under the `mailer` and `sms` targets instead of a delivery service.
pub struct LocalAuthProvider {
    store: Arc<dyn DocumentStore>,
    public_base_url: String,
    code_ttl: Duration,
    pending: Mutex<HashMap<ConfirmationHandle, PendingCode>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    verification_code: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl AccountRecord {
    fn into_account(self, uid: Uuid) -> AuthAccount {
        AuthAccount {
            uid,
            email: self.email,
            phone: self.phone,
            email_verified: self.email_verified,
        }
    }
}

struct PendingCode {
    phone: String,
    code: String,
    expires_at: DateTime<Utc>,
}

impl LocalAuthProvider {
    pub fn new(store: Arc<dyn DocumentStore>, public_base_url: &str, code_ttl_secs: i64) -> Self {
        Self {
            store,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            code_ttl: Duration::seconds(code_ttl_secs),
            pending: Mutex::new(HashMap::new()),
        }
    }

    async fn find_by(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<(Uuid, AccountRecord)>, AuthProviderError> {
        let query = DocumentQuery::all().where_eq(field, value);
        let doc = self.store.query(AUTH_ACCOUNTS, &query).await?.into_iter().next();
        match doc {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, uid: Uuid, record: &AccountRecord) -> Result<(), AuthProviderError> {
        self.store
            .update(AUTH_ACCOUNTS, uid, to_document_data(record)?)
            .await?;
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, AuthProviderError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthProviderError::Internal(e.to_string()))
}

fn password_matches(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn one_time_code() -> String {
    format!("{:06}", OsRng.next_u32() % 1_000_000)
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthAccount, AuthProviderError> {
        if self.find_by("email", email).await?.is_some() {
            return Err(AuthProviderError::EmailAlreadyInUse);
        }

        let record = AccountRecord {
            email: Some(email.to_string()),
            password_hash: Some(hash_password(password)?),
            created_at: Some(Utc::now()),
            ..AccountRecord::default()
        };
        let uid = match self
            .store
            .insert(AUTH_ACCOUNTS, to_document_data(&record)?)
            .await
        {
            Ok(uid) => uid,
            Err(err) => {
                // Lost a race on the unique email index.
                if self.find_by("email", email).await?.is_some() {
                    return Err(AuthProviderError::EmailAlreadyInUse);
                }
                return Err(err.into());
            }
        };

        tracing::debug!(%uid, "account created");
        Ok(record.into_account(uid))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthAccount, AuthProviderError> {
        let (uid, record) = self
            .find_by("email", email)
            .await?
            .ok_or(AuthProviderError::InvalidCredentials)?;

        let hash = record
            .password_hash
            .as_deref()
            .ok_or(AuthProviderError::InvalidCredentials)?;
        if !password_matches(password, hash) {
            return Err(AuthProviderError::InvalidCredentials);
        }

        Ok(record.into_account(uid))
    }

    async fn send_email_verification(&self, uid: Uuid) -> Result<(), AuthProviderError> {
        let doc = self
            .store
            .get(AUTH_ACCOUNTS, uid)
            .await?
            .ok_or(AuthProviderError::UnknownAccount(uid))?;
        let (_, mut record): (Uuid, AccountRecord) = from_document(doc)?;
        let email = record
            .email
            .clone()
            .ok_or_else(|| AuthProviderError::Internal("account has no email address".into()))?;

        let code = Uuid::new_v4().simple().to_string();
        record.verification_code = Some(code.clone());
        self.save(uid, &record).await?;

        let link = format!("{}/api/auth/verify-email?code={}", self.public_base_url, code);
        tracing::info!(target: "mailer", to = %email, %link, "verification email dispatched");
        Ok(())
    }

    async fn confirm_email_verification(
        &self,
        code: &str,
    ) -> Result<AuthAccount, AuthProviderError> {
        if code.is_empty() {
            return Err(AuthProviderError::InvalidCode);
        }
        let (uid, mut record) = self
            .find_by("verificationCode", code)
            .await?
            .ok_or(AuthProviderError::InvalidCode)?;

        record.email_verified = true;
        record.verification_code = None;
        self.save(uid, &record).await?;

        Ok(record.into_account(uid))
    }

    async fn send_phone_code(&self, phone: &str) -> Result<ConfirmationHandle, AuthProviderError> {
        let handle = ConfirmationHandle(Uuid::new_v4().to_string());
        let code = one_time_code();
        let now = Utc::now();
        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.retain(|_, entry| entry.expires_at > now);
            pending.insert(
                handle.clone(),
                PendingCode {
                    phone: phone.to_string(),
                    code: code.clone(),
                    expires_at: now + self.code_ttl,
                },
            );
        }

        tracing::info!(target: "sms", to = %phone, %code, "one-time code dispatched");
        Ok(handle)
    }

    async fn confirm_phone_code(
        &self,
        handle: &ConfirmationHandle,
        code: &str,
    ) -> Result<AuthAccount, AuthProviderError> {
        let phone = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = pending.get(handle).ok_or(AuthProviderError::CodeExpired)?;
            if entry.expires_at <= Utc::now() {
                pending.remove(handle);
                return Err(AuthProviderError::CodeExpired);
            }
            if entry.code != code {
                return Err(AuthProviderError::InvalidCode);
            }
            let phone = entry.phone.clone();
            pending.remove(handle);
            phone
        };

        if let Some((uid, record)) = self.find_by("phone", &phone).await? {
            return Ok(record.into_account(uid));
        }

        let record = AccountRecord {
            phone: Some(phone.clone()),
            created_at: Some(Utc::now()),
            ..AccountRecord::default()
        };
        let uid = match self
            .store
            .insert(AUTH_ACCOUNTS, to_document_data(&record)?)
            .await
        {
            Ok(uid) => uid,
            Err(err) => match self.find_by("phone", &phone).await? {
                Some((uid, existing)) => return Ok(existing.into_account(uid)),
                None => return Err(err.into()),
            },
        };
        tracing::debug!(%uid, "phone account created");
        Ok(record.into_account(uid))
    }

    async fn discard_phone_code(&self, handle: &ConfirmationHandle) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle);
    }
}

#[cfg(test)]
impl LocalAuthProvider {
    /// Reads the last code sent to `handle`; stands in for the user's handset.
    pub(crate) fn peek_code(&self, handle: &ConfirmationHandle) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(handle)
            .map(|entry| entry.code.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::store::{Document, MemoryStore, StoreError};

    fn provider() -> LocalAuthProvider {
        LocalAuthProvider::new(Arc::new(MemoryStore::new()), "http://localhost:3000/", 300)
    }

    /// Lets a concurrent sign-up land first, then rejects the caller's insert
    /// the way the unique account index does.
    #[derive(Default)]
    struct RacingStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        async fn insert(&self, collection: &str, data: Value) -> Result<Uuid, StoreError> {
            self.inner.insert(collection, data).await?;
            Err(StoreError::Backend("duplicate key value violates unique constraint".into()))
        }

        async fn set(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
            self.inner.set(collection, id, data).await
        }

        async fn update(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
            self.inner.update(collection, id, data).await
        }

        async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
            self.inner.delete(collection, id).await
        }

        async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
            self.inner.get(collection, id).await
        }

        async fn query(
            &self,
            collection: &str,
            query: &DocumentQuery,
        ) -> Result<Vec<Document>, StoreError> {
            self.inner.query(collection, query).await
        }

        async fn count(&self, collection: &str) -> Result<u64, StoreError> {
            self.inner.count(collection).await
        }
    }

    #[tokio::test]
    async fn losing_a_sign_up_race_reports_a_duplicate() {
        let auth = LocalAuthProvider::new(Arc::new(RacingStore::default()), "http://localhost", 300);
        let err = auth.create_account("a@b.com", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthProviderError::EmailAlreadyInUse));
    }

    #[tokio::test]
    async fn losing_a_phone_account_race_returns_the_winner() {
        let auth = LocalAuthProvider::new(Arc::new(RacingStore::default()), "http://localhost", 300);
        let handle = auth.send_phone_code("+919876543210").await.unwrap();
        let code = auth.peek_code(&handle).unwrap();
        let account = auth.confirm_phone_code(&handle, &code).await.unwrap();
        assert_eq!(account.phone.as_deref(), Some("+919876543210"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = provider();
        auth.create_account("a@b.com", "secret1").await.unwrap();
        let err = auth.create_account("a@b.com", "secret2").await.unwrap_err();
        assert!(matches!(err, AuthProviderError::EmailAlreadyInUse));
    }

    #[tokio::test]
    async fn password_sign_in_checks_the_hash() {
        let auth = provider();
        let created = auth.create_account("a@b.com", "secret1").await.unwrap();
        assert!(!created.email_verified);

        let signed_in = auth.sign_in_with_password("a@b.com", "secret1").await.unwrap();
        assert_eq!(signed_in.uid, created.uid);

        assert!(matches!(
            auth.sign_in_with_password("a@b.com", "wrong-pass").await,
            Err(AuthProviderError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in_with_password("nobody@b.com", "secret1").await,
            Err(AuthProviderError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn phone_code_is_single_use() {
        let auth = provider();
        let handle = auth.send_phone_code("+919876543210").await.unwrap();
        let code = auth.peek_code(&handle).unwrap();
        assert_eq!(code.len(), 6);

        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert!(matches!(
            auth.confirm_phone_code(&handle, wrong).await,
            Err(AuthProviderError::InvalidCode)
        ));

        let account = auth.confirm_phone_code(&handle, &code).await.unwrap();
        assert_eq!(account.phone.as_deref(), Some("+919876543210"));
        assert!(matches!(
            auth.confirm_phone_code(&handle, &code).await,
            Err(AuthProviderError::CodeExpired)
        ));

        let handle = auth.send_phone_code("+919876543210").await.unwrap();
        let code = auth.peek_code(&handle).unwrap();
        auth.discard_phone_code(&handle).await;
        assert!(auth.peek_code(&handle).is_none());
        assert!(matches!(
            auth.confirm_phone_code(&handle, &code).await,
            Err(AuthProviderError::CodeExpired)
        ));

        // The same number maps back to the same account.
        let handle = auth.send_phone_code("+919876543210").await.unwrap();
        let code = auth.peek_code(&handle).unwrap();
        let again = auth.confirm_phone_code(&handle, &code).await.unwrap();
        assert_eq!(again.uid, account.uid);
    }
}
