mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tour_booking_api::{
    auth::{
        AuthAccount, AuthProvider, AuthProviderError, ConfirmationHandle, LocalAuthProvider,
    },
    dto::auth::{CredentialsRequest, VerifyEmailQuery},
    error::AppError,
    middleware::auth::Principal,
    models::{Role, User},
    services::auth_service,
    store::{AUTH_ACCOUNTS, DocumentQuery, DocumentStore, MemoryStore, USERS},
};
use uuid::Uuid;

/// Counts every call that reaches the provider.
struct CountingProvider {
    inner: LocalAuthProvider,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthProvider for CountingProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthAccount, AuthProviderError> {
        self.hit();
        self.inner.create_account(email, password).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthAccount, AuthProviderError> {
        self.hit();
        self.inner.sign_in_with_password(email, password).await
    }

    async fn send_email_verification(&self, uid: Uuid) -> Result<(), AuthProviderError> {
        self.hit();
        self.inner.send_email_verification(uid).await
    }

    async fn confirm_email_verification(&self, code: &str) -> Result<AuthAccount, AuthProviderError> {
        self.hit();
        self.inner.confirm_email_verification(code).await
    }

    async fn send_phone_code(&self, phone: &str) -> Result<ConfirmationHandle, AuthProviderError> {
        self.hit();
        self.inner.send_phone_code(phone).await
    }

    async fn confirm_phone_code(
        &self,
        handle: &ConfirmationHandle,
        code: &str,
    ) -> Result<AuthAccount, AuthProviderError> {
        self.hit();
        self.inner.confirm_phone_code(handle, code).await
    }
}

fn creds(email: &str, password: &str) -> CredentialsRequest {
    CredentialsRequest {
        email: email.into(),
        password: password.into(),
    }
}

async fn verification_code(store: &dyn DocumentStore, email: &str) -> String {
    let query = DocumentQuery::all().where_eq("email", email);
    let doc = store
        .query(AUTH_ACCOUNTS, &query)
        .await
        .expect("query accounts")
        .into_iter()
        .next()
        .expect("account exists");
    doc.data["verificationCode"]
        .as_str()
        .expect("verification code")
        .to_string()
}

#[tokio::test]
async fn invalid_credentials_are_rejected_before_the_provider() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let provider = Arc::new(CountingProvider {
        inner: LocalAuthProvider::new(Arc::clone(&store), "http://localhost:3000", 300),
        calls: AtomicUsize::new(0),
    });
    let state = common::state_with(Arc::clone(&store), provider.clone());

    let err = auth_service::sign_up(&state, creds("a@b.com", "short"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Password must be at least 6 characters"));

    let err = auth_service::sign_in(&state, creds("not-an-email", "longenough"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Please enter a valid email address");

    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn sign_in_waits_for_email_verification() -> anyhow::Result<()> {
    let state = common::memory_state();

    let signed_up = auth_service::sign_up(&state, creds(" Jane@Example.com", "secret1"))
        .await?
        .data
        .expect("sign-up");
    assert!(signed_up.verification_sent);
    assert_eq!(signed_up.email, "jane@example.com");

    let err = auth_service::sign_in(&state, creds("jane@example.com", "secret1"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Please verify your email before logging in. Check your inbox."
    );

    let code = verification_code(state.store.as_ref(), "jane@example.com").await;
    auth_service::verify_email(&state, VerifyEmailQuery { code: code.clone() }).await?;

    // Links are single use.
    let err = auth_service::verify_email(&state, VerifyEmailQuery { code })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let login = auth_service::sign_in(&state, creds("JANE@example.com", "secret1"))
        .await?
        .data
        .expect("login");
    assert_eq!(login.role, Role::Customer);
    assert_eq!(login.uid, signed_up.uid);

    let claims = state
        .sessions
        .verify(login.token.trim_start_matches("Bearer "))?;
    let principal = Principal::from_claims(claims)?;
    assert!(matches!(principal, Principal::Customer(ref u) if u.email.as_deref() == Some("jane@example.com")));
    Ok(())
}

#[tokio::test]
async fn provider_failures_map_to_user_messages() -> anyhow::Result<()> {
    let state = common::memory_state();
    auth_service::sign_up(&state, creds("jane@example.com", "secret1")).await?;

    let err = auth_service::sign_up(&state, creds("jane@example.com", "another1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Email already exists. Please login instead."));

    let err = auth_service::sign_in(&state, creds("jane@example.com", "wrong-password"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid email or password");

    let err = auth_service::sign_in(&state, creds("ghost@example.com", "secret1"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid email or password");
    Ok(())
}

#[tokio::test]
async fn administrator_skips_verification() -> anyhow::Result<()> {
    let state = common::memory_state();
    let uid = auth_service::bootstrap_admin(&state).await?;
    // Running it again finds the same account.
    assert_eq!(auth_service::bootstrap_admin(&state).await?, uid);

    let login = auth_service::sign_in(
        &state,
        creds(common::ADMIN_EMAIL, common::ADMIN_PASSWORD),
    )
    .await?
    .data
    .expect("login");
    assert_eq!(login.role, Role::Administrator);
    assert_eq!(login.uid, uid);
    Ok(())
}

#[tokio::test]
async fn bootstrap_rewrites_an_unreadable_admin_profile() -> anyhow::Result<()> {
    let state = common::memory_state();
    let uid = auth_service::bootstrap_admin(&state).await?;
    state
        .store
        .set(USERS, uid, serde_json::json!({ "role": 42 }))
        .await?;

    assert_eq!(auth_service::bootstrap_admin(&state).await?, uid);
    let doc = state.store.get(USERS, uid).await?.expect("profile");
    let user = User::try_from(doc)?;
    assert_eq!(user.profile.role, Role::Administrator);
    assert_eq!(user.profile.email.as_deref(), Some(common::ADMIN_EMAIL));
    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_session() -> anyhow::Result<()> {
    let state = common::memory_state();
    auth_service::bootstrap_admin(&state).await?;
    let login = auth_service::sign_in(
        &state,
        creds(common::ADMIN_EMAIL, common::ADMIN_PASSWORD),
    )
    .await?
    .data
    .expect("login");
    let token = login.token.trim_start_matches("Bearer ").to_string();

    let principal = Principal::from_claims(state.sessions.verify(&token)?)?;
    let info = auth_service::session_info(&principal);
    assert!(info.authenticated);
    assert_eq!(info.role, Some(Role::Administrator));

    auth_service::logout(&state, &principal).await?;
    assert!(matches!(state.sessions.verify(&token), Err(AppError::Unauthorized(_))));

    let err = auth_service::logout(&state, &Principal::Anonymous)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}
