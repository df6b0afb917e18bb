mod common;

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tour_booking_api::{
    auth::{
        AuthAccount, AuthProvider, AuthProviderError, ChallengeVerifier, ConfirmationHandle,
        LocalChallengeVerifier, PhoneAuthController, PhoneFlowState,
        phone::{MAX_CODE_ATTEMPTS, PhoneFlowError},
    },
    dto::auth::{SendPhoneCodeRequest, VerifyPhoneCodeRequest},
    error::AppError,
    middleware::auth::Principal,
    models::{Role, User},
    services::auth_service,
    store::{DocumentStore, MemoryStore, USERS},
};
use uuid::Uuid;

const CODE: &str = "123456";

/// Accepts [`CODE`] for every number and hands out one stable account per number.
#[derive(Default)]
struct FixedCodeProvider {
    sent: AtomicUsize,
    discarded: AtomicUsize,
    accounts: Mutex<HashMap<String, Uuid>>,
}

#[async_trait]
impl AuthProvider for FixedCodeProvider {
    async fn create_account(&self, _: &str, _: &str) -> Result<AuthAccount, AuthProviderError> {
        Err(AuthProviderError::Internal("unsupported".into()))
    }

    async fn sign_in_with_password(&self, _: &str, _: &str) -> Result<AuthAccount, AuthProviderError> {
        Err(AuthProviderError::InvalidCredentials)
    }

    async fn send_email_verification(&self, uid: Uuid) -> Result<(), AuthProviderError> {
        Err(AuthProviderError::UnknownAccount(uid))
    }

    async fn confirm_email_verification(&self, _: &str) -> Result<AuthAccount, AuthProviderError> {
        Err(AuthProviderError::InvalidCode)
    }

    async fn send_phone_code(&self, phone: &str) -> Result<ConfirmationHandle, AuthProviderError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(ConfirmationHandle(phone.to_string()))
    }

    async fn confirm_phone_code(
        &self,
        handle: &ConfirmationHandle,
        code: &str,
    ) -> Result<AuthAccount, AuthProviderError> {
        if code != CODE {
            return Err(AuthProviderError::InvalidCode);
        }
        let uid = *self
            .accounts
            .lock()
            .unwrap()
            .entry(handle.0.clone())
            .or_insert_with(Uuid::new_v4);
        Ok(AuthAccount {
            uid,
            email: None,
            phone: Some(handle.0.clone()),
            email_verified: false,
        })
    }

    async fn discard_phone_code(&self, _: &ConfirmationHandle) {
        self.discarded.fetch_add(1, Ordering::SeqCst);
    }
}

fn controller(
    provider: &Arc<FixedCodeProvider>,
    secret: Option<&str>,
    ttl_secs: i64,
) -> PhoneAuthController {
    let verifier: Arc<dyn ChallengeVerifier> =
        Arc::new(LocalChallengeVerifier::new(secret.map(str::to_string)));
    PhoneAuthController::new(provider.clone(), verifier, "91", ttl_secs)
}

#[tokio::test]
async fn happy_path_with_a_failed_attempt_in_between() -> anyhow::Result<()> {
    let provider = Arc::new(FixedCodeProvider::default());
    let phone = controller(&provider, None, 300);

    let view = phone.send_code(None, None, "98765 43210", "token").await?;
    assert_eq!(view.state, PhoneFlowState::OtpSent);
    assert_eq!(view.phone.as_deref(), Some("+919876543210"));

    let err = phone.verify_code(view.flow_id, "12345").await.unwrap_err();
    assert!(matches!(err, PhoneFlowError::InvalidCodeFormat));

    let err = phone.verify_code(view.flow_id, "000000").await.unwrap_err();
    assert!(matches!(err, PhoneFlowError::WrongCode));
    assert_eq!(
        AppError::from(err).to_string(),
        "Invalid OTP. Please try again."
    );
    assert_eq!(phone.view(view.flow_id).unwrap().state, PhoneFlowState::OtpSent);

    let account = phone.verify_code(view.flow_id, CODE).await?;
    assert_eq!(account.phone.as_deref(), Some("+919876543210"));
    // A finished attempt is gone.
    assert!(phone.view(view.flow_id).is_none());
    Ok(())
}

#[tokio::test]
async fn repeated_wrong_codes_lock_the_attempt() -> anyhow::Result<()> {
    let provider = Arc::new(FixedCodeProvider::default());
    let phone = controller(&provider, None, 300);
    let view = phone.send_code(None, None, "9876543210", "token").await?;

    for _ in 1..MAX_CODE_ATTEMPTS {
        let err = phone.verify_code(view.flow_id, "000000").await.unwrap_err();
        assert!(matches!(err, PhoneFlowError::WrongCode));
    }
    let err = phone.verify_code(view.flow_id, "000000").await.unwrap_err();
    assert!(matches!(err, PhoneFlowError::TooManyAttempts));
    assert_eq!(
        AppError::from(err).to_string(),
        "Too many attempts. Please start again."
    );
    assert_eq!(provider.discarded.load(Ordering::SeqCst), 1);
    assert!(phone.view(view.flow_id).is_none());

    // The right code no longer gets in.
    let err = phone.verify_code(view.flow_id, CODE).await.unwrap_err();
    assert!(matches!(err, PhoneFlowError::UnknownFlow));
    Ok(())
}

#[tokio::test]
async fn bad_numbers_and_failed_challenges_send_nothing() {
    let provider = Arc::new(FixedCodeProvider::default());
    let phone = controller(&provider, Some("human"), 300);

    let err = phone.send_code(None, None, "12345", "human").await.unwrap_err();
    assert_eq!(
        AppError::from(err).to_string(),
        "Please enter a valid 10-digit phone number"
    );

    let err = phone
        .send_code(None, Some("+1"), "5550104477", "robot")
        .await
        .unwrap_err();
    assert!(matches!(err, PhoneFlowError::Challenge(_)));
    assert_eq!(
        AppError::from(err).to_string(),
        "Human verification failed. Please try again."
    );

    let err = phone.send_code(None, None, "9876543210", "").await.unwrap_err();
    assert!(matches!(err, PhoneFlowError::Challenge(_)));

    assert_eq!(provider.sent.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn change_number_returns_to_phone_entry() -> anyhow::Result<()> {
    let provider = Arc::new(FixedCodeProvider::default());
    let phone = controller(&provider, None, 300);

    let view = phone.send_code(None, None, "9876543210", "token").await?;
    let resent = phone.resend(view.flow_id, "token").await?;
    assert_eq!(resent.state, PhoneFlowState::OtpSent);
    assert_eq!(provider.sent.load(Ordering::SeqCst), 2);

    let back = phone.change_number(view.flow_id)?;
    assert_eq!(back.state, PhoneFlowState::EnteringPhone);
    assert!(back.phone.is_none());

    let err = phone.verify_code(view.flow_id, CODE).await.unwrap_err();
    assert!(matches!(
        err,
        PhoneFlowError::WrongState {
            expected: PhoneFlowState::OtpSent,
            actual: PhoneFlowState::EnteringPhone
        }
    ));
    assert!(matches!(AppError::from(err), AppError::Conflict(_)));

    let view = phone
        .send_code(Some(view.flow_id), Some("44"), "7700 900123", "token")
        .await?;
    assert_eq!(view.phone.as_deref(), Some("+447700900123"));
    let account = phone.verify_code(view.flow_id, CODE).await?;
    assert_eq!(account.phone.as_deref(), Some("+447700900123"));
    Ok(())
}

#[tokio::test]
async fn stale_attempts_expire() -> anyhow::Result<()> {
    let provider = Arc::new(FixedCodeProvider::default());
    let phone = controller(&provider, None, 1);

    let view = phone.send_code(None, None, "9876543210", "token").await?;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let err = phone.verify_code(view.flow_id, CODE).await.unwrap_err();
    assert!(matches!(err, PhoneFlowError::UnknownFlow));
    Ok(())
}

#[tokio::test]
async fn verified_phone_gets_a_customer_session() -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let provider = Arc::new(FixedCodeProvider::default());
    let state = common::state_with(Arc::clone(&store), provider);

    let flow = auth_service::send_phone_code(
        &state,
        SendPhoneCodeRequest {
            flow_id: None,
            country_code: None,
            phone: "98765-43210".into(),
            challenge_token: "token".into(),
        },
    )
    .await?
    .data
    .expect("flow");

    let signed_in = auth_service::verify_phone_code(
        &state,
        VerifyPhoneCodeRequest {
            flow_id: flow.flow_id,
            code: CODE.into(),
        },
    )
    .await?
    .data
    .expect("sign-in");
    assert_eq!(signed_in.flow.state, PhoneFlowState::Authenticated);
    assert_eq!(signed_in.session.role, Role::Customer);

    let doc = store.get(USERS, signed_in.session.uid).await?.expect("profile");
    let user = User::try_from(doc)?;
    assert_eq!(user.profile.phone.as_deref(), Some("+919876543210"));
    assert!(user.profile.email.is_none());

    let claims = state
        .sessions
        .verify(signed_in.session.token.trim_start_matches("Bearer "))?;
    let principal = Principal::from_claims(claims)?;
    assert!(matches!(principal, Principal::Customer(ref u) if u.phone.as_deref() == Some("+919876543210")));
    Ok(())
}
