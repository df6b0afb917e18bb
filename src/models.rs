use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::status::{BookingStatus, classify};
use crate::store::{Document, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Administrator => "administrator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    #[serde(flatten)]
    pub profile: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Ticket {
    #[serde(rename = "type", default = "default_ticket_type")]
    pub kind: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub pnr: String,
    #[serde(default)]
    pub seats: String,
    #[serde(default)]
    pub notes: String,
}

fn default_ticket_type() -> String {
    "Flight".to_string()
}

impl Default for Ticket {
    fn default() -> Self {
        Self {
            kind: default_ticket_type(),
            from: String::new(),
            to: String::new(),
            date: String::new(),
            time: String::new(),
            pnr: String::new(),
            seats: String::new(),
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Taxi {
    pub driver_name: String,
    pub driver_phone: String,
    pub vehicle_type: String,
    pub vehicle_number: String,
    pub pickup_location: String,
    pub pickup_time: String,
}

/// Stored shape of a booking document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingFields {
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub package_id: Uuid,
    pub package_name: String,
    pub destination: String,
    #[serde(default)]
    pub itinerary: BTreeMap<String, String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
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
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: BookingFields,
}

impl Booking {
    pub fn live_status(&self, today: NaiveDate) -> BookingStatus {
        classify(self.fields.start_date, self.fields.end_date, today)
    }

    /// Replaces the write-time `status` with the one computed for `today`.
    pub fn with_live_status(mut self, today: NaiveDate) -> Self {
        self.fields.status = self.live_status(today);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackageFields {
    pub package_name: String,
    pub destination: String,
    pub duration: String,
    #[serde(default)]
    pub itinerary: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Package {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: PackageFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ItineraryDay {
    pub day: u32,
    pub key: String,
    pub description: String,
}

/// Orders `day_N` keys by their numeric part; keys without digits count as day 0.
pub fn itinerary_days(itinerary: &BTreeMap<String, String>) -> Vec<ItineraryDay> {
    let mut days: Vec<ItineraryDay> = itinerary
        .iter()
        .map(|(key, description)| ItineraryDay {
            day: day_number(key),
            key: key.clone(),
            description: description.clone(),
        })
        .collect();
    days.sort_by(|a, b| a.day.cmp(&b.day).then_with(|| a.key.cmp(&b.key)));
    days
}

fn day_number(key: &str) -> u32 {
    let digits: String = key.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

pub fn to_document_data<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(value)?)
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<(Uuid, T), StoreError> {
    let value = serde_json::from_value(doc.data)?;
    Ok((doc.id, value))
}

impl TryFrom<Document> for Booking {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let (id, fields) = from_document(doc)?;
        Ok(Self { id, fields })
    }
}

impl TryFrom<Document> for Package {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let (id, fields) = from_document(doc)?;
        Ok(Self { id, fields })
    }
}

impl TryFrom<Document> for User {
    type Error = StoreError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let (id, profile) = from_document(doc)?;
        Ok(Self { id, profile })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itinerary_sorts_by_numeric_day_suffix() {
        let mut itinerary = BTreeMap::new();
        for n in [10, 2, 1, 11, 3] {
            itinerary.insert(format!("day_{n}"), format!("activity {n}"));
        }
        itinerary.insert("arrival".into(), "no digits".into());

        let days: Vec<u32> = itinerary_days(&itinerary).iter().map(|d| d.day).collect();
        assert_eq!(days, vec![0, 1, 2, 3, 10, 11]);
    }

    #[test]
    fn ticket_type_defaults_to_flight() {
        let ticket: Ticket = serde_json::from_value(serde_json::json!({ "from": "Delhi" })).unwrap();
        assert_eq!(ticket.kind, "Flight");
        assert_eq!(ticket.from, "Delhi");
        assert!(ticket.pnr.is_empty());
    }
}
