use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::ProjectIdentity,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
        tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    let data = HealthData {
        status: "ok".to_string(),
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    get,
    path = "/api/client-config",
    responses(
        (status = 200, description = "Public project identity for the browser client", body = ApiResponse<ProjectIdentity>),
    ),
    tag = "Health"
)]
pub async fn client_config(State(state): State<AppState>) -> Json<ApiResponse<ProjectIdentity>> {
    Json(ApiResponse::success(
        "Client config",
        state.config.project.clone(),
        Some(Meta::empty()),
    ))
}
