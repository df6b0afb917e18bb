use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::bookings::{BookingDashboard, BookingDetails},
    error::AppResult,
    middleware::auth::Principal,
    response::ApiResponse,
    routes::params::BookingListQuery,
    services::booking_service,
    state::AppState,
    status,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_bookings))
        .route("/{id}", get(get_my_booking))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Signed-in customer's bookings, bucketed by status", body = ApiResponse<BookingDashboard>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not a customer"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn list_my_bookings(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<ApiResponse<BookingDashboard>>> {
    let resp =
        booking_service::customer_dashboard(&state, &principal, query.status, status::today())
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking with its day-by-day itinerary", body = ApiResponse<BookingDetails>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn get_my_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookingDetails>>> {
    let resp = booking_service::customer_booking(&state, &principal, id, status::today()).await?;
    Ok(Json(resp))
}
