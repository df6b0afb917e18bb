use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Upcoming,
    Current,
    Past,
}

/// Buckets a trip relative to `today`. Both ends of the range count as current.
pub fn classify(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> BookingStatus {
    if today < start {
        BookingStatus::Upcoming
    } else if today <= end {
        BookingStatus::Current
    } else {
        BookingStatus::Past
    }
}

/// The single "now" a request classifies against.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusCounts {
    pub upcoming: usize,
    pub current: usize,
    pub past: usize,
}

impl StatusCounts {
    pub fn tally(statuses: impl IntoIterator<Item = BookingStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                BookingStatus::Upcoming => counts.upcoming += 1,
                BookingStatus::Current => counts.current += 1,
                BookingStatus::Past => counts.past += 1,
            }
        }
        counts
    }

    pub fn get(&self, status: BookingStatus) -> usize {
        match status {
            BookingStatus::Upcoming => self.upcoming,
            BookingStatus::Current => self.current,
            BookingStatus::Past => self.past,
        }
    }

    pub fn total(&self) -> usize {
        self.upcoming + self.current + self.past
    }
}
