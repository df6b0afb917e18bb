use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    dto::bookings::{BookingDashboard, BookingDetails},
    error::{AppError, AppResult},
    middleware::auth::{Principal, SessionUser, ensure_customer},
    models::{Booking, itinerary_days},
    response::{ApiResponse, Meta},
    status::BookingStatus,
    state::AppState,
    store::{BOOKINGS, Direction, DocumentQuery, DocumentStore},
};

/// Runs a booking query and stamps each result with its live status.
///
/// A failing query logs and yields an empty list, as does any document that
/// no longer deserializes as a booking.
pub(crate) async fn load_bookings(
    store: &dyn DocumentStore,
    query: &DocumentQuery,
    today: NaiveDate,
) -> Vec<Booking> {
    let docs = match store.query(BOOKINGS, query).await {
        Ok(docs) => docs,
        Err(err) => {
            tracing::error!(error = %err, "failed to load bookings");
            return Vec::new();
        }
    };

    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id;
            match Booking::try_from(doc) {
                Ok(booking) => Some(booking.with_live_status(today)),
                Err(err) => {
                    tracing::warn!(booking = %id, error = %err, "skipping malformed booking");
                    None
                }
            }
        })
        .collect()
}

/// Bookings belonging to the signed-in customer: by email, or by phone for
/// phone-only accounts.
fn owner_query(user: &SessionUser) -> AppResult<DocumentQuery> {
    let query = match (&user.email, &user.phone) {
        (Some(email), _) => DocumentQuery::all().where_eq("customerEmail", email.as_str()),
        (None, Some(phone)) => DocumentQuery::all().where_eq("customerPhone", phone.as_str()),
        (None, None) => {
            return Err(AppError::Unauthorized(
                "Session has no email or phone attached".into(),
            ));
        }
    };
    Ok(query.order_by("startDate", Direction::Desc))
}

fn owns(user: &SessionUser, booking: &Booking) -> bool {
    match (&user.email, &user.phone) {
        (Some(email), _) => booking.fields.customer_email == *email,
        (None, Some(phone)) => booking.fields.customer_phone == *phone,
        (None, None) => false,
    }
}

pub async fn customer_dashboard(
    state: &AppState,
    principal: &Principal,
    status: Option<BookingStatus>,
    today: NaiveDate,
) -> AppResult<ApiResponse<BookingDashboard>> {
    let user = ensure_customer(principal)?;
    let query = owner_query(user)?;

    let bookings = load_bookings(state.store.as_ref(), &query, today).await;
    let dashboard = BookingDashboard::partition(bookings, status);
    let meta = Meta::total(dashboard.items.len());

    Ok(ApiResponse::success("Bookings", dashboard, Some(meta)))
}

pub async fn customer_booking(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    today: NaiveDate,
) -> AppResult<ApiResponse<BookingDetails>> {
    let user = ensure_customer(principal)?;

    let booking = match state.store.get(BOOKINGS, id).await? {
        Some(doc) => Booking::try_from(doc)?.with_live_status(today),
        None => return Err(AppError::NotFound),
    };
    // Someone else's booking is indistinguishable from a missing one.
    if !owns(user, &booking) {
        return Err(AppError::NotFound);
    }

    let itinerary = itinerary_days(&booking.fields.itinerary);
    Ok(ApiResponse::success(
        "Booking found",
        BookingDetails { booking, itinerary },
        Some(Meta::empty()),
    ))
}
