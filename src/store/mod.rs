//! Document store boundary.
//!
//! Every collection the service touches (`bookings`, `users`, `packages`,
//! `audit_logs`, `auth_accounts`) is a bag of JSON documents keyed by a
//! store-assigned UUID. The typed models in [`crate::models`] convert to and
//! from [`Document`].

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

pub const BOOKINGS: &str = "bookings";
pub const USERS: &str = "users";
pub const PACKAGES: &str = "packages";
pub const AUDIT_LOGS: &str = "audit_logs";
pub const AUTH_ACCOUNTS: &str = "auth_accounts";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: Uuid },

    #[error("invalid field name `{0}`")]
    InvalidField(String),

    #[error("database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("malformed document")]
    Serialization(#[from] serde_json::Error),

    #[error("store backend unavailable: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Equality filters joined with AND, plus an optional single sort key.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
}

impl DocumentQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        let fields = self
            .filters
            .iter()
            .map(|(field, _)| field)
            .chain(self.order_by.as_ref().map(|(field, _)| field));
        for field in fields {
            if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(StoreError::InvalidField(field.clone()));
            }
        }
        Ok(())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and returns its store-assigned id.
    async fn insert(&self, collection: &str, data: Value) -> Result<Uuid, StoreError>;

    /// Writes a document under a caller-chosen id, replacing any existing one.
    async fn set(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError>;

    /// Overwrites an existing document. Fails with `NotFound` if absent.
    async fn update(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError>;

    async fn query(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: &str) -> Result<u64, StoreError>;
}

/// Text form used for equality comparisons, matching Postgres `->>`.
pub(crate) fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_field_names_outside_the_identifier_charset() {
        let ok = DocumentQuery::all()
            .where_eq("customerEmail", "a@b.com")
            .order_by("startDate", Direction::Desc);
        assert!(ok.validate().is_ok());

        let bad = DocumentQuery::all().where_eq("data' OR 1=1 --", "x");
        assert!(matches!(bad.validate(), Err(StoreError::InvalidField(_))));
    }

    #[test]
    fn text_form_of_values() {
        assert_eq!(value_as_text(&Value::from("abc")).as_deref(), Some("abc"));
        assert_eq!(value_as_text(&Value::from(3)).as_deref(), Some("3"));
        assert_eq!(value_as_text(&Value::Bool(true)).as_deref(), Some("true"));
        assert_eq!(value_as_text(&Value::Null), None);
    }
}
