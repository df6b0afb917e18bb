use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::status::BookingStatus;

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct BookingListQuery {
    /// Bucket to list; all bookings when omitted.
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}
