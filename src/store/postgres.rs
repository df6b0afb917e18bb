use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use uuid::Uuid;

use super::{Direction, Document, DocumentQuery, DocumentStore, StoreError, value_as_text};
use crate::entity::documents::{ActiveModel, Column, Entity as Documents, Model};

/// All collections share one `documents` table; the payload lives in a JSONB column.
#[derive(Clone)]
pub struct PgDocumentStore {
    conn: DatabaseConnection,
}

impl PgDocumentStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

fn document_from_entity(model: Model) -> Document {
    Document {
        id: model.id,
        data: model.data,
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, data: Value) -> Result<Uuid, StoreError> {
        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            collection: Set(collection.to_string()),
            data: Set(data),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.conn)
        .await?;
        Ok(model.id)
    }

    async fn set(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
        let now = Utc::now();
        let active = ActiveModel {
            id: Set(id),
            collection: Set(collection.to_string()),
            data: Set(data),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        Documents::insert(active)
            .on_conflict(
                OnConflict::column(Column::Id)
                    .update_columns([Column::Collection, Column::Data, Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
        let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();
        let result = Documents::update_many()
            .col_expr(Column::Data, Expr::value(data))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Collection.eq(collection))
            .filter(Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id,
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        let result = Documents::delete_many()
            .filter(Column::Collection.eq(collection))
            .filter(Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id,
            });
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let model = Documents::find_by_id(id)
            .filter(Column::Collection.eq(collection))
            .one(&self.conn)
            .await?;
        Ok(model.map(document_from_entity))
    }

    async fn query(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, StoreError> {
        query.validate()?;

        let mut finder = Documents::find().filter(Column::Collection.eq(collection));
        for (field, value) in &query.filters {
            finder = match value_as_text(value) {
                Some(text) => {
                    finder.filter(Expr::cust_with_values("data ->> ? = ?", [field.clone(), text]))
                }
                None => finder.filter(Expr::cust_with_values("data ->> ? IS NULL", [field.clone()])),
            };
        }

        if let Some((field, direction)) = &query.order_by {
            let order = match direction {
                Direction::Asc => Order::Asc,
                Direction::Desc => Order::Desc,
            };
            finder = finder.order_by(Expr::cust_with_values("data ->> ?", [field.clone()]), order);
        }
        finder = finder.order_by_asc(Column::CreatedAt);

        let docs = finder
            .all(&self.conn)
            .await?
            .into_iter()
            .map(document_from_entity)
            .collect();
        Ok(docs)
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let total = Documents::find()
            .filter(Column::Collection.eq(collection))
            .count(&self.conn)
            .await?;
        Ok(total)
    }
}
