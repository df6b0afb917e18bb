use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::bookings::{
        BookingDashboard, BookingForm, BookingFormError, CustomerList, CustomerSummary,
        TicketPatch, ValidBooking,
    },
    error::{AppError, AppResult},
    middleware::auth::{Principal, SessionUser, ensure_admin},
    models::{Booking, BookingFields, Package, PackageFields, Role, User, to_document_data},
    response::{ApiResponse, Meta},
    services::{
        booking_service::load_bookings,
        package_service::{self, SeedReport},
    },
    state::AppState,
    status::{self, BookingStatus, classify},
    store::{BOOKINGS, Direction, DocumentQuery, PACKAGES, StoreError, USERS},
};

const SAVE_FAILED: &str = "Failed to save booking. Please try again.";
const DELETE_FAILED: &str = "Failed to delete booking. Please try again.";

fn save_failed(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound { .. } => AppError::NotFound,
        other => {
            tracing::error!(error = %other, "booking write failed");
            AppError::Unavailable(SAVE_FAILED.into())
        }
    }
}

/// Store failures while preparing a write report the save message too.
fn preparing_save(err: AppError) -> AppError {
    match err {
        AppError::Store(err) => save_failed(err),
        other => other,
    }
}

async fn audit_booking(state: &AppState, admin: &SessionUser, action: &str, id: Uuid) {
    audit::record(
        state.store.as_ref(),
        Some(admin.uid),
        action,
        Some(BOOKINGS),
        Some(json!({ "booking_id": id })),
    )
    .await;
}

async fn find_booking(state: &AppState, id: Uuid) -> AppResult<Booking> {
    match state.store.get(BOOKINGS, id).await? {
        Some(doc) => Ok(Booking::try_from(doc)?),
        None => Err(AppError::NotFound),
    }
}

async fn find_package(state: &AppState, id: Uuid) -> AppResult<Package> {
    match state.store.get(PACKAGES, id).await? {
        Some(doc) => Ok(Package::try_from(doc)?),
        None => Err(BookingFormError::UnknownPackage.into()),
    }
}

/// Package details copied onto a booking.
struct PackageSnapshot {
    package_name: String,
    destination: String,
    itinerary: BTreeMap<String, String>,
}

impl From<PackageFields> for PackageSnapshot {
    fn from(package: PackageFields) -> Self {
        Self {
            package_name: package.package_name,
            destination: package.destination,
            itinerary: package.itinerary,
        }
    }
}

impl From<BookingFields> for PackageSnapshot {
    fn from(booking: BookingFields) -> Self {
        Self {
            package_name: booking.package_name,
            destination: booking.destination,
            itinerary: booking.itinerary,
        }
    }
}

fn booking_fields(
    valid: ValidBooking,
    snapshot: PackageSnapshot,
    created_at: DateTime<Utc>,
    today: NaiveDate,
) -> BookingFields {
    let PackageSnapshot {
        package_name,
        destination,
        itinerary,
    } = snapshot;
    BookingFields {
        status: classify(valid.start_date, valid.end_date, today),
        customer_email: valid.customer_email,
        customer_name: valid.customer_name,
        customer_phone: valid.customer_phone,
        package_id: valid.package_id,
        package_name,
        destination,
        itinerary,
        start_date: valid.start_date,
        end_date: valid.end_date,
        travelers: valid.travelers,
        pricing_option: valid.pricing_option,
        total_amount: valid.total_amount,
        accommodation: valid.accommodation,
        meal_plan: valid.meal_plan,
        tickets: valid.tickets,
        taxi: valid.taxi,
        created_at,
        updated_at: Utc::now(),
    }
}

pub async fn dashboard(
    state: &AppState,
    principal: &Principal,
    status: Option<BookingStatus>,
    today: NaiveDate,
) -> AppResult<ApiResponse<BookingDashboard>> {
    ensure_admin(principal)?;

    let query = DocumentQuery::all().order_by("startDate", Direction::Desc);
    let bookings = load_bookings(state.store.as_ref(), &query, today).await;
    let dashboard = BookingDashboard::partition(bookings, status);
    let meta = Meta::total(dashboard.items.len());

    Ok(ApiResponse::success("Bookings", dashboard, Some(meta)))
}

pub async fn get_booking(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    today: NaiveDate,
) -> AppResult<ApiResponse<Booking>> {
    ensure_admin(principal)?;
    let booking = find_booking(state, id).await?.with_live_status(today);
    Ok(ApiResponse::success("Booking found", booking, Some(Meta::empty())))
}

pub async fn booking_form(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> AppResult<ApiResponse<BookingForm>> {
    ensure_admin(principal)?;
    let booking = find_booking(state, id).await?;
    Ok(ApiResponse::success(
        "Booking form",
        BookingForm::from_booking(&booking),
        Some(Meta::empty()),
    ))
}

pub async fn create_booking(
    state: &AppState,
    principal: &Principal,
    form: BookingForm,
) -> AppResult<ApiResponse<Booking>> {
    let admin = ensure_admin(principal)?;
    let valid = form
        .validate()?
        .with_country_code(&state.config.default_country_code);
    let package = find_package(state, valid.package_id)
        .await
        .map_err(preparing_save)?;

    let fields = booking_fields(valid, package.fields.into(), Utc::now(), status::today());
    let id = state
        .store
        .insert(BOOKINGS, to_document_data(&fields).map_err(save_failed)?)
        .await
        .map_err(save_failed)?;

    tracing::info!(booking = %id, customer = %fields.customer_email, "booking created");
    audit_booking(state, admin, "booking_create", id).await;

    Ok(ApiResponse::success(
        "Booking created",
        Booking { id, fields },
        Some(Meta::empty()),
    ))
}

/// Overwrites the whole booking. The package snapshot is only re-taken when
/// the package itself changes.
pub async fn update_booking(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    form: BookingForm,
) -> AppResult<ApiResponse<Booking>> {
    let admin = ensure_admin(principal)?;
    let valid = form
        .validate()?
        .with_country_code(&state.config.default_country_code);
    let existing = find_booking(state, id).await.map_err(preparing_save)?;

    let created_at = existing.fields.created_at;
    let snapshot = if existing.fields.package_id == valid.package_id {
        PackageSnapshot::from(existing.fields)
    } else {
        let package = find_package(state, valid.package_id)
            .await
            .map_err(preparing_save)?;
        PackageSnapshot::from(package.fields)
    };

    let fields = booking_fields(valid, snapshot, created_at, status::today());
    state
        .store
        .update(BOOKINGS, id, to_document_data(&fields).map_err(save_failed)?)
        .await
        .map_err(save_failed)?;

    tracing::info!(booking = %id, "booking updated");
    audit_booking(state, admin, "booking_update", id).await;

    Ok(ApiResponse::success(
        "Booking updated",
        Booking { id, fields },
        Some(Meta::empty()),
    ))
}

pub async fn delete_booking(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    confirmed: bool,
) -> AppResult<ApiResponse<Uuid>> {
    let admin = ensure_admin(principal)?;
    if !confirmed {
        return Err(AppError::ConfirmationRequired(
            "Are you sure you want to delete this booking?".into(),
        ));
    }

    state
        .store
        .delete(BOOKINGS, id)
        .await
        .map_err(|err| match err {
            StoreError::NotFound { .. } => AppError::NotFound,
            other => {
                tracing::error!(booking = %id, error = %other, "booking delete failed");
                AppError::Unavailable(DELETE_FAILED.into())
            }
        })?;

    tracing::info!(booking = %id, "booking deleted");
    audit_booking(state, admin, "booking_delete", id).await;

    Ok(ApiResponse::success("Booking deleted", id, Some(Meta::empty())))
}

/// Loads the booking as a form, applies `edit`, and saves it through
/// [`update_booking`].
async fn edit_tickets<F>(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    edit: F,
) -> AppResult<ApiResponse<Booking>>
where
    F: FnOnce(&mut BookingForm) -> Result<(), BookingFormError>,
{
    ensure_admin(principal)?;
    let booking = find_booking(state, id).await.map_err(preparing_save)?;
    let mut form = BookingForm::from_booking(&booking);
    edit(&mut form)?;
    update_booking(state, principal, id, form).await
}

pub async fn add_ticket(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    edit_tickets(state, principal, id, |form| {
        form.add_ticket();
        Ok(())
    })
    .await
}

pub async fn update_ticket(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    index: usize,
    patch: TicketPatch,
) -> AppResult<ApiResponse<Booking>> {
    edit_tickets(state, principal, id, |form| {
        form.update_ticket(index, patch.field, patch.value)
    })
    .await
}

pub async fn remove_ticket(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    index: usize,
) -> AppResult<ApiResponse<Booking>> {
    edit_tickets(state, principal, id, |form| form.remove_ticket(index).map(|_| ())).await
}

/// Customer accounts with the number of bookings under their email.
pub async fn list_customers(
    state: &AppState,
    principal: &Principal,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_admin(principal)?;

    let query = DocumentQuery::all().where_eq("role", Role::Customer.as_str());
    let users: Vec<User> = match state.store.query(USERS, &query).await {
        Ok(docs) => docs
            .into_iter()
            .filter_map(|doc| User::try_from(doc).ok())
            .collect(),
        Err(err) => {
            tracing::error!(error = %err, "failed to load customers");
            Vec::new()
        }
    };

    let bookings = load_bookings(state.store.as_ref(), &DocumentQuery::all(), status::today()).await;
    let items: Vec<CustomerSummary> = users
        .into_iter()
        .map(|user| {
            let booking_count = match &user.profile.email {
                Some(email) => bookings
                    .iter()
                    .filter(|b| b.fields.customer_email == *email)
                    .count(),
                None => 0,
            };
            CustomerSummary {
                user,
                booking_count,
            }
        })
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Customers", CustomerList { items }, Some(meta)))
}

pub async fn list_packages(
    state: &AppState,
    principal: &Principal,
) -> AppResult<ApiResponse<Vec<Package>>> {
    ensure_admin(principal)?;
    let packages = package_service::list_packages(state.store.as_ref()).await;
    let meta = Meta::total(packages.len());
    Ok(ApiResponse::success("Packages", packages, Some(meta)))
}

pub async fn seed_packages(
    state: &AppState,
    principal: &Principal,
    confirmed: bool,
) -> AppResult<ApiResponse<SeedReport>> {
    let admin = ensure_admin(principal)?;
    let report = package_service::seed_packages(state.store.as_ref(), confirmed).await?;

    audit::record(
        state.store.as_ref(),
        Some(admin.uid),
        "packages_seed",
        Some(PACKAGES),
        Some(json!({ "inserted": report.inserted })),
    )
    .await;

    Ok(ApiResponse::success(
        format!("All {} packages added successfully", report.inserted),
        report,
        Some(Meta::empty()),
    ))
}
