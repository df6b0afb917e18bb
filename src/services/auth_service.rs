use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    auth::{AuthAccount, AuthProviderError, PhoneFlowState, phone::PhoneFlowView},
    dto::auth::{
        CredentialsRequest, LoginResponse, PhoneSignInResponse, SendPhoneCodeRequest,
        SessionInfo, SignUpResponse, VerifyEmailQuery, VerifyPhoneCodeRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{Principal, ensure_signed_in},
    models::{Role, User, UserProfile, to_document_data},
    response::{ApiResponse, Meta},
    state::AppState,
    store::USERS,
};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

fn provider_failure(operation: &str, err: AuthProviderError) -> AppError {
    tracing::error!(error = %err, operation, "auth provider call failed");
    AppError::Unavailable(GENERIC_FAILURE.into())
}

async fn load_profile(state: &AppState, uid: Uuid) -> AppResult<Option<User>> {
    match state.store.get(USERS, uid).await? {
        Some(doc) => Ok(Some(User::try_from(doc)?)),
        None => Ok(None),
    }
}

/// The stored profile for `account`, created as a customer when missing.
async fn ensure_profile(state: &AppState, account: &AuthAccount) -> AppResult<User> {
    if let Some(user) = load_profile(state, account.uid).await? {
        return Ok(user);
    }

    let profile = UserProfile {
        email: account.email.clone(),
        phone: account.phone.clone(),
        role: Role::Customer,
        created_at: Utc::now(),
    };
    state
        .store
        .set(USERS, account.uid, to_document_data(&profile)?)
        .await?;
    tracing::info!(uid = %account.uid, "customer profile created");
    Ok(User {
        id: account.uid,
        profile,
    })
}

fn start_session(state: &AppState, user: &User) -> AppResult<LoginResponse> {
    let token = state.sessions.issue(
        user.id,
        user.profile.role,
        user.profile.email.clone(),
        user.profile.phone.clone(),
    )?;
    Ok(LoginResponse {
        token,
        uid: user.id,
        role: user.profile.role,
    })
}

async fn audit_user(state: &AppState, uid: Uuid, action: &str) {
    audit::record(
        state.store.as_ref(),
        Some(uid),
        action,
        Some(USERS),
        Some(json!({ "user_id": uid })),
    )
    .await;
}

/// Creates the account and its customer profile, then sends the verification
/// link. No session is issued until the address is verified.
pub async fn sign_up(
    state: &AppState,
    payload: CredentialsRequest,
) -> AppResult<ApiResponse<SignUpResponse>> {
    let CredentialsRequest { email, password } = payload.normalized()?;
    const SIGN_UP_FAILED: &str = "Failed to create account. Please try again.";

    let account = match state.auth.create_account(&email, &password).await {
        Ok(account) => account,
        Err(AuthProviderError::EmailAlreadyInUse) => {
            return Err(AppError::Conflict(
                "Email already exists. Please login instead.".into(),
            ));
        }
        Err(err) => {
            tracing::error!(error = %err, "sign-up failed");
            return Err(AppError::Unavailable(SIGN_UP_FAILED.into()));
        }
    };

    let profile = UserProfile {
        email: Some(email.clone()),
        phone: None,
        role: Role::Customer,
        created_at: Utc::now(),
    };
    let written = match to_document_data(&profile) {
        Ok(data) => state.store.set(USERS, account.uid, data).await,
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        tracing::error!(uid = %account.uid, error = %err, "profile write failed");
        return Err(AppError::Unavailable(SIGN_UP_FAILED.into()));
    }

    if let Err(err) = state.auth.send_email_verification(account.uid).await {
        tracing::error!(uid = %account.uid, error = %err, "verification email failed");
        return Err(AppError::Unavailable(SIGN_UP_FAILED.into()));
    }

    audit_user(state, account.uid, "user_register").await;

    Ok(ApiResponse::success(
        "Verification email sent. Please verify your email, then log in.",
        SignUpResponse {
            uid: account.uid,
            email,
            verification_sent: true,
        },
        Some(Meta::empty()),
    ))
}

/// Password sign-in. Customers must have verified their email; administrators
/// are exempt.
pub async fn sign_in(
    state: &AppState,
    payload: CredentialsRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let CredentialsRequest { email, password } = payload.normalized()?;

    let account = match state.auth.sign_in_with_password(&email, &password).await {
        Ok(account) => account,
        Err(AuthProviderError::InvalidCredentials) => {
            return Err(AppError::Unauthorized("Invalid email or password".into()));
        }
        Err(err) => return Err(provider_failure("sign_in", err)),
    };

    let user = ensure_profile(state, &account).await?;
    if user.profile.role != Role::Administrator && !account.email_verified {
        tracing::info!(uid = %account.uid, "sign-in blocked until email is verified");
        return Err(AppError::Unauthorized(
            "Please verify your email before logging in. Check your inbox.".into(),
        ));
    }

    let session = start_session(state, &user)?;
    audit_user(state, user.id, "user_login").await;

    Ok(ApiResponse::success("Logged in", session, Some(Meta::empty())))
}

pub async fn verify_email(
    state: &AppState,
    query: VerifyEmailQuery,
) -> AppResult<ApiResponse<SessionInfo>> {
    let account = match state.auth.confirm_email_verification(query.code.trim()).await {
        Ok(account) => account,
        Err(AuthProviderError::InvalidCode | AuthProviderError::CodeExpired) => {
            return Err(AppError::BadRequest(
                "This verification link is invalid or has already been used.".into(),
            ));
        }
        Err(err) => return Err(provider_failure("verify_email", err)),
    };

    audit_user(state, account.uid, "user_verify_email").await;

    Ok(ApiResponse::success(
        "Email verified. You can now log in.",
        SessionInfo {
            authenticated: false,
            uid: Some(account.uid),
            role: None,
            email: account.email,
            phone: account.phone,
        },
        Some(Meta::empty()),
    ))
}

pub async fn logout(state: &AppState, principal: &Principal) -> AppResult<ApiResponse<SessionInfo>> {
    let user = ensure_signed_in(principal)?;
    state.sessions.revoke(&user.claims);
    audit_user(state, user.uid, "user_logout").await;

    Ok(ApiResponse::success(
        "Logged out",
        session_info(&Principal::Anonymous),
        Some(Meta::empty()),
    ))
}

pub fn session_info(principal: &Principal) -> SessionInfo {
    match principal.user() {
        Some(user) => SessionInfo {
            authenticated: true,
            uid: Some(user.uid),
            role: principal.role(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        },
        None => SessionInfo {
            authenticated: false,
            uid: None,
            role: None,
            email: None,
            phone: None,
        },
    }
}

pub async fn send_phone_code(
    state: &AppState,
    payload: SendPhoneCodeRequest,
) -> AppResult<ApiResponse<PhoneFlowView>> {
    let view = state
        .phone
        .send_code(
            payload.flow_id,
            payload.country_code.as_deref(),
            &payload.phone,
            &payload.challenge_token,
        )
        .await?;
    Ok(ApiResponse::success("OTP sent", view, Some(Meta::empty())))
}

pub async fn resend_phone_code(
    state: &AppState,
    flow_id: Uuid,
    challenge_token: &str,
) -> AppResult<ApiResponse<PhoneFlowView>> {
    let view = state.phone.resend(flow_id, challenge_token).await?;
    Ok(ApiResponse::success("OTP re-sent", view, Some(Meta::empty())))
}

pub fn change_phone_number(state: &AppState, flow_id: Uuid) -> AppResult<ApiResponse<PhoneFlowView>> {
    let view = state.phone.change_number(flow_id)?;
    Ok(ApiResponse::success("Enter a new number", view, Some(Meta::empty())))
}

pub fn phone_flow(state: &AppState, flow_id: Uuid) -> AppResult<ApiResponse<PhoneFlowView>> {
    let view = state.phone.view(flow_id).ok_or_else(|| {
        AppError::BadRequest("Sign-in attempt expired. Please start again.".into())
    })?;
    Ok(ApiResponse::success("Sign-in attempt", view, Some(Meta::empty())))
}

/// Confirms the code, creates the profile on first sign-in, and issues a session.
pub async fn verify_phone_code(
    state: &AppState,
    payload: VerifyPhoneCodeRequest,
) -> AppResult<ApiResponse<PhoneSignInResponse>> {
    let account = state.phone.verify_code(payload.flow_id, &payload.code).await?;
    let user = ensure_profile(state, &account).await?;
    let session = start_session(state, &user)?;
    audit_user(state, user.id, "user_login_phone").await;

    let flow = PhoneFlowView {
        flow_id: payload.flow_id,
        state: PhoneFlowState::Authenticated,
        phone: account.phone,
    };
    Ok(ApiResponse::success(
        "Logged in",
        PhoneSignInResponse { flow, session },
        Some(Meta::empty()),
    ))
}

/// Makes sure the configured administrator exists with the administrator role.
pub async fn bootstrap_admin(state: &AppState) -> anyhow::Result<Uuid> {
    let admin = &state.config.admin;
    let account = match state.auth.create_account(&admin.email, &admin.password).await {
        Ok(account) => account,
        Err(AuthProviderError::EmailAlreadyInUse) => state
            .auth
            .sign_in_with_password(&admin.email, &admin.password)
            .await
            .map_err(|err| anyhow::anyhow!("administrator sign-in failed: {err}"))?,
        Err(err) => anyhow::bail!("administrator account setup failed: {err}"),
    };

    let created_at = match load_profile(state, account.uid).await {
        Ok(Some(user)) => user.profile.created_at,
        Ok(None) => Utc::now(),
        Err(err) => {
            tracing::warn!(uid = %account.uid, error = %err, "administrator profile unreadable; rewriting it");
            Utc::now()
        }
    };
    let profile = UserProfile {
        email: Some(admin.email.clone()),
        phone: None,
        role: Role::Administrator,
        created_at,
    };
    state
        .store
        .set(USERS, account.uid, to_document_data(&profile)?)
        .await?;

    tracing::info!(uid = %account.uid, email = %admin.email, "administrator account ready");
    Ok(account.uid)
}
