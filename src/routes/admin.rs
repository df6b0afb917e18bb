use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::bookings::{BookingDashboard, BookingForm, CustomerList, TicketPatch},
    error::AppResult,
    middleware::auth::Principal,
    models::{Booking, Package},
    response::ApiResponse,
    routes::params::{BookingListQuery, ConfirmQuery},
    services::{admin_service, package_service::SeedReport},
    state::AppState,
    status,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route(
            "/bookings/{id}",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .route("/bookings/{id}/form", get(booking_form))
        .route("/bookings/{id}/tickets", post(add_ticket))
        .route(
            "/bookings/{id}/tickets/{index}",
            patch(update_ticket).delete(remove_ticket),
        )
        .route("/customers", get(list_customers))
        .route("/packages", get(list_packages))
        .route("/packages/seed", post(seed_packages))
}

#[utoipa::path(
    get,
    path = "/api/admin/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "All bookings, bucketed by status", body = ApiResponse<BookingDashboard>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<ApiResponse<BookingDashboard>>> {
    let resp = admin_service::dashboard(&state, &principal, query.status, status::today()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/bookings",
    request_body = BookingForm,
    responses(
        (status = 200, description = "Create booking", body = ApiResponse<Booking>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 404, description = "Package not found"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    principal: Principal,
    Json(form): Json<BookingForm>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::create_booking(&state, &principal, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Get booking", body = ApiResponse<Booking>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::get_booking(&state, &principal, id, status::today()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = BookingForm,
    responses(
        (status = 200, description = "Replace booking", body = ApiResponse<Booking>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(form): Json<BookingForm>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::update_booking(&state, &principal, id, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/bookings/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID"),
        ConfirmQuery
    ),
    responses(
        (status = 200, description = "Booking deleted", body = ApiResponse<Uuid>),
        (status = 409, description = "Repeat with confirm=true"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> AppResult<Json<ApiResponse<Uuid>>> {
    let resp = admin_service::delete_booking(&state, &principal, id, query.confirm).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/bookings/{id}/form",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Edit form pre-filled from the booking", body = ApiResponse<BookingForm>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn booking_form(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookingForm>>> {
    let resp = admin_service::booking_form(&state, &principal, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/bookings/{id}/tickets",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Blank flight ticket appended", body = ApiResponse<Booking>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn add_ticket(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::add_ticket(&state, &principal, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/bookings/{id}/tickets/{index}",
    params(
        ("id" = Uuid, Path, description = "Booking ID"),
        ("index" = usize, Path, description = "Ticket position, from 0")
    ),
    request_body = TicketPatch,
    responses(
        (status = 200, description = "Ticket field updated", body = ApiResponse<Booking>),
        (status = 404, description = "Booking or ticket not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_ticket(
    State(state): State<AppState>,
    principal: Principal,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(patch): Json<TicketPatch>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::update_ticket(&state, &principal, id, index, patch).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/bookings/{id}/tickets/{index}",
    params(
        ("id" = Uuid, Path, description = "Booking ID"),
        ("index" = usize, Path, description = "Ticket position, from 0")
    ),
    responses(
        (status = 200, description = "Ticket removed", body = ApiResponse<Booking>),
        (status = 404, description = "Booking or ticket not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn remove_ticket(
    State(state): State<AppState>,
    principal: Principal,
    Path((id, index)): Path<(Uuid, usize)>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = admin_service::remove_ticket(&state, &principal, id, index).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/customers",
    responses(
        (status = 200, description = "Customers with booking counts", body = ApiResponse<CustomerList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<ApiResponse<CustomerList>>> {
    let resp = admin_service::list_customers(&state, &principal).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/packages",
    responses(
        (status = 200, description = "Package templates", body = ApiResponse<Vec<Package>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_packages(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<Json<ApiResponse<Vec<Package>>>> {
    let resp = admin_service::list_packages(&state, &principal).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/packages/seed",
    params(ConfirmQuery),
    responses(
        (status = 200, description = "Package templates uploaded", body = ApiResponse<SeedReport>),
        (status = 409, description = "Packages already exist; repeat with confirm=true"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn seed_packages(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ConfirmQuery>,
) -> AppResult<Json<ApiResponse<SeedReport>>> {
    let resp = admin_service::seed_packages(&state, &principal, query.confirm).await?;
    Ok(Json(resp))
}
