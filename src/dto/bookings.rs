use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::phone::PhoneNumber,
    error::AppError,
    models::{Booking, ItineraryDay, Taxi, Ticket, User},
    status::{BookingStatus, StatusCounts},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingFormError {
    #[error("Please fill in all customer details")]
    MissingCustomerDetails,

    #[error("Please fill in package and date details")]
    MissingPackageOrDates,

    #[error("Dates must be in YYYY-MM-DD format")]
    InvalidDate,

    #[error("Number of travelers must be at least 1")]
    NoTravelers,

    #[error("End date cannot be before start date")]
    EndBeforeStart,

    #[error("Package not found")]
    UnknownPackage,

    #[error("No ticket at position {0}")]
    NoSuchTicket(usize),
}

impl From<BookingFormError> for AppError {
    fn from(err: BookingFormError) -> Self {
        match err {
            BookingFormError::UnknownPackage | BookingFormError::NoSuchTicket(_) => {
                AppError::NotFound
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

fn default_travelers() -> u32 {
    1
}

/// Admin create/edit form. Text inputs arrive as entered; [`BookingForm::validate`]
/// turns them into a [`ValidBooking`].
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub package_id: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default = "default_travelers")]
    pub travelers: u32,
    #[serde(default)]
    pub pricing_option: String,
    #[serde(default)]
    pub total_amount: String,
    #[serde(default)]
    pub accommodation: String,
    #[serde(default)]
    pub meal_plan: String,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub taxi: Taxi,
}

/// A form that passed validation, with contact fields normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub package_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travelers: u32,
    pub pricing_option: String,
    pub total_amount: String,
    pub accommodation: String,
    pub meal_plan: String,
    pub tickets: Vec<Ticket>,
    pub taxi: Taxi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TicketField {
    Type,
    From,
    To,
    Date,
    Time,
    Pnr,
    Seats,
    Notes,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Strips whitespace and dashes so stored numbers compare by digits.
pub fn compact_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Compacts `phone` and, when it is a bare ten-digit national number, prefixes
/// `default_country_code` so it lines up with phone sign-in identities.
pub fn canonical_phone(phone: &str, default_country_code: &str) -> String {
    let compact = compact_phone(phone);
    if compact.starts_with('+') {
        return compact;
    }
    match PhoneNumber::parse(default_country_code, &compact) {
        Some(number) => number.e164(),
        None => compact,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, BookingFormError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| BookingFormError::InvalidDate)
}

impl ValidBooking {
    pub fn with_country_code(mut self, default_country_code: &str) -> Self {
        self.customer_phone = canonical_phone(&self.customer_phone, default_country_code);
        self
    }
}

impl BookingForm {
    /// Pre-fills the form from a stored booking.
    pub fn from_booking(booking: &Booking) -> Self {
        let f = &booking.fields;
        Self {
            customer_email: f.customer_email.clone(),
            customer_name: f.customer_name.clone(),
            customer_phone: f.customer_phone.clone(),
            package_id: f.package_id.to_string(),
            start_date: f.start_date.format("%Y-%m-%d").to_string(),
            end_date: f.end_date.format("%Y-%m-%d").to_string(),
            travelers: f.travelers,
            pricing_option: f.pricing_option.clone(),
            total_amount: f.total_amount.clone(),
            accommodation: f.accommodation.clone(),
            meal_plan: f.meal_plan.clone(),
            tickets: f.tickets.clone(),
            taxi: f.taxi.clone(),
        }
    }

    /// Appends a blank flight ticket and returns its index.
    pub fn add_ticket(&mut self) -> usize {
        self.tickets.push(Ticket::default());
        self.tickets.len() - 1
    }

    pub fn update_ticket(
        &mut self,
        index: usize,
        field: TicketField,
        value: impl Into<String>,
    ) -> Result<(), BookingFormError> {
        let ticket = self
            .tickets
            .get_mut(index)
            .ok_or(BookingFormError::NoSuchTicket(index))?;
        let slot = match field {
            TicketField::Type => &mut ticket.kind,
            TicketField::From => &mut ticket.from,
            TicketField::To => &mut ticket.to,
            TicketField::Date => &mut ticket.date,
            TicketField::Time => &mut ticket.time,
            TicketField::Pnr => &mut ticket.pnr,
            TicketField::Seats => &mut ticket.seats,
            TicketField::Notes => &mut ticket.notes,
        };
        *slot = value.into();
        Ok(())
    }

    /// Removes the ticket at `index`; later tickets shift down by one.
    pub fn remove_ticket(&mut self, index: usize) -> Result<Ticket, BookingFormError> {
        if index >= self.tickets.len() {
            return Err(BookingFormError::NoSuchTicket(index));
        }
        Ok(self.tickets.remove(index))
    }

    pub fn validate(&self) -> Result<ValidBooking, BookingFormError> {
        let customer_email = normalize_email(&self.customer_email);
        let customer_name = self.customer_name.trim().to_string();
        let customer_phone = compact_phone(&self.customer_phone);
        if customer_email.is_empty() || customer_name.is_empty() || customer_phone.is_empty() {
            return Err(BookingFormError::MissingCustomerDetails);
        }

        let package_id = self.package_id.trim();
        if package_id.is_empty() || self.start_date.trim().is_empty() || self.end_date.trim().is_empty()
        {
            return Err(BookingFormError::MissingPackageOrDates);
        }
        let package_id =
            Uuid::parse_str(package_id).map_err(|_| BookingFormError::UnknownPackage)?;

        let start_date = parse_date(&self.start_date)?;
        let end_date = parse_date(&self.end_date)?;
        if self.travelers < 1 {
            return Err(BookingFormError::NoTravelers);
        }
        if end_date < start_date {
            return Err(BookingFormError::EndBeforeStart);
        }

        Ok(ValidBooking {
            customer_email,
            customer_name,
            customer_phone,
            package_id,
            start_date,
            end_date,
            travelers: self.travelers,
            pricing_option: self.pricing_option.trim().to_string(),
            total_amount: self.total_amount.trim().to_string(),
            accommodation: self.accommodation.trim().to_string(),
            meal_plan: self.meal_plan.trim().to_string(),
            tickets: self.tickets.clone(),
            taxi: self.taxi.clone(),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TicketPatch {
    pub field: TicketField,
    pub value: String,
}

/// Per-bucket counts plus the items of the selected bucket.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDashboard {
    pub counts: StatusCounts,
    pub status: Option<BookingStatus>,
    pub items: Vec<Booking>,
}

impl BookingDashboard {
    /// `bookings` must already carry their live status.
    pub fn partition(bookings: Vec<Booking>, status: Option<BookingStatus>) -> Self {
        let counts = StatusCounts::tally(bookings.iter().map(|b| b.fields.status));
        let items = match status {
            Some(wanted) => bookings
                .into_iter()
                .filter(|b| b.fields.status == wanted)
                .collect(),
            None => bookings,
        };
        Self {
            counts,
            status,
            items,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetails {
    pub booking: Booking,
    pub itinerary: Vec<ItineraryDay>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub user: User,
    pub booking_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerList {
    pub items: Vec<CustomerSummary>,
}
