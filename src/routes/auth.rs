use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    auth::phone::PhoneFlowView,
    dto::auth::{
        CredentialsRequest, LoginResponse, PhoneFlowRequest, PhoneSignInResponse,
        ResendPhoneCodeRequest, SendPhoneCodeRequest, SessionInfo, SignUpResponse,
        VerifyEmailQuery, VerifyPhoneCodeRequest,
    },
    error::AppResult,
    middleware::auth::Principal,
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
        .route("/verify-email", get(verify_email))
        .route("/phone/send", post(send_phone_code))
        .route("/phone/resend", post(resend_phone_code))
        .route("/phone/change-number", post(change_phone_number))
        .route("/phone/verify", post(verify_phone_code))
        .route("/phone/{flow_id}", get(phone_flow))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Account created; verification email sent", body = ApiResponse<SignUpResponse>),
        (status = 400, description = "Invalid email or short password"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Auth"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> AppResult<Json<ApiResponse<SignUpResponse>>> {
    let resp = auth_service::sign_up(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials or unverified email")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::sign_in(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session revoked", body = ApiResponse<SessionInfo>),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<ApiResponse<SessionInfo>>> {
    let resp = auth_service::logout(&state, &principal).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current principal", body = ApiResponse<SessionInfo>)
    ),
    tag = "Auth"
)]
pub async fn session(principal: Principal) -> Json<ApiResponse<SessionInfo>> {
    Json(ApiResponse::success(
        "Session",
        auth_service::session_info(&principal),
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    get,
    path = "/api/auth/verify-email",
    params(("code" = String, Query, description = "Code from the verification link")),
    responses(
        (status = 200, description = "Email verified", body = ApiResponse<SessionInfo>),
        (status = 400, description = "Unknown or used code")
    ),
    tag = "Auth"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> AppResult<Json<ApiResponse<SessionInfo>>> {
    let resp = auth_service::verify_email(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/phone/send",
    request_body = SendPhoneCodeRequest,
    responses(
        (status = 200, description = "OTP sent", body = ApiResponse<PhoneFlowView>),
        (status = 400, description = "Invalid number or failed challenge"),
        (status = 409, description = "Sign-in attempt is not waiting for a number")
    ),
    tag = "Auth"
)]
pub async fn send_phone_code(
    State(state): State<AppState>,
    Json(payload): Json<SendPhoneCodeRequest>,
) -> AppResult<Json<ApiResponse<PhoneFlowView>>> {
    let resp = auth_service::send_phone_code(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/phone/resend",
    request_body = ResendPhoneCodeRequest,
    responses(
        (status = 200, description = "OTP re-sent", body = ApiResponse<PhoneFlowView>),
        (status = 409, description = "No code outstanding")
    ),
    tag = "Auth"
)]
pub async fn resend_phone_code(
    State(state): State<AppState>,
    Json(payload): Json<ResendPhoneCodeRequest>,
) -> AppResult<Json<ApiResponse<PhoneFlowView>>> {
    let resp =
        auth_service::resend_phone_code(&state, payload.flow_id, &payload.challenge_token).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/phone/change-number",
    request_body = PhoneFlowRequest,
    responses(
        (status = 200, description = "Back to number entry", body = ApiResponse<PhoneFlowView>),
        (status = 409, description = "No code outstanding")
    ),
    tag = "Auth"
)]
pub async fn change_phone_number(
    State(state): State<AppState>,
    Json(payload): Json<PhoneFlowRequest>,
) -> AppResult<Json<ApiResponse<PhoneFlowView>>> {
    let resp = auth_service::change_phone_number(&state, payload.flow_id)?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/phone/verify",
    request_body = VerifyPhoneCodeRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<PhoneSignInResponse>),
        (status = 400, description = "Wrong, malformed or expired code")
    ),
    tag = "Auth"
)]
pub async fn verify_phone_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPhoneCodeRequest>,
) -> AppResult<Json<ApiResponse<PhoneSignInResponse>>> {
    let resp = auth_service::verify_phone_code(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/phone/{flow_id}",
    params(("flow_id" = Uuid, Path, description = "Sign-in attempt ID")),
    responses(
        (status = 200, description = "Current state of the attempt", body = ApiResponse<PhoneFlowView>),
        (status = 400, description = "Unknown or expired attempt")
    ),
    tag = "Auth"
)]
pub async fn phone_flow(
    State(state): State<AppState>,
    Path(flow_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PhoneFlowView>>> {
    let resp = auth_service::phone_flow(&state, flow_id)?;
    Ok(Json(resp))
}
