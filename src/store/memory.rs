use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::RwLock,
};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{Direction, Document, DocumentQuery, DocumentStore, StoreError, value_as_text};

/// Process-local store used for `STORE_BACKEND=memory` and the test suite.
///
/// Documents keep insertion order within a collection, which is what an
/// unsorted query returns.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

#[derive(Default)]
struct Collection {
    next_seq: u64,
    docs: HashMap<Uuid, (u64, Value)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("memory store lock poisoned".into())
}

fn field_text(data: &Value, field: &str) -> Option<String> {
    data.get(field).and_then(value_as_text)
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => value_as_text(x).cmp(&value_as_text(y)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, data: Value) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.set(collection, id, data).await?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
        let mut guard = self.collections.write().map_err(poisoned)?;
        let coll = guard.entry(collection.to_string()).or_default();
        let seq = match coll.docs.get(&id) {
            Some((seq, _)) => *seq,
            None => {
                coll.next_seq += 1;
                coll.next_seq
            }
        };
        coll.docs.insert(id, (seq, data));
        Ok(())
    }

    async fn update(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
        let mut guard = self.collections.write().map_err(poisoned)?;
        let slot = guard
            .get_mut(collection)
            .and_then(|coll| coll.docs.get_mut(&id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id,
            })?;
        slot.1 = data;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        let mut guard = self.collections.write().map_err(poisoned)?;
        guard
            .get_mut(collection)
            .and_then(|coll| coll.docs.remove(&id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id,
            })
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.read().map_err(poisoned)?;
        Ok(guard
            .get(collection)
            .and_then(|coll| coll.docs.get(&id))
            .map(|(_, data)| Document {
                id,
                data: data.clone(),
            }))
    }

    async fn query(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, StoreError> {
        query.validate()?;
        let guard = self.collections.read().map_err(poisoned)?;
        let Some(coll) = guard.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: BTreeMap<u64, Document> = BTreeMap::new();
        for (id, (seq, data)) in &coll.docs {
            let keep = query
                .filters
                .iter()
                .all(|(field, expected)| field_text(data, field) == value_as_text(expected));
            if keep {
                matched.insert(
                    *seq,
                    Document {
                        id: *id,
                        data: data.clone(),
                    },
                );
            }
        }

        let mut docs: Vec<Document> = matched.into_values().collect();
        if let Some((field, direction)) = &query.order_by {
            docs.sort_by(|a, b| {
                let ord = compare_field(&a.data, &b.data, field);
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        Ok(docs)
    }

    async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let guard = self.collections.read().map_err(poisoned)?;
        Ok(guard
            .get(collection)
            .map(|coll| coll.docs.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn filters_and_sorts_documents() {
        let store = MemoryStore::new();
        store
            .insert("bookings", json!({ "customerEmail": "a@b.com", "startDate": "2024-02-15" }))
            .await
            .unwrap();
        store
            .insert("bookings", json!({ "customerEmail": "x@y.com", "startDate": "2024-05-01" }))
            .await
            .unwrap();
        store
            .insert("bookings", json!({ "customerEmail": "a@b.com", "startDate": "2024-06-01" }))
            .await
            .unwrap();

        let query = DocumentQuery::all()
            .where_eq("customerEmail", "a@b.com")
            .order_by("startDate", Direction::Desc);
        let docs = store.query("bookings", &query).await.unwrap();
        let starts: Vec<_> = docs.iter().map(|d| d.data["startDate"].clone()).collect();
        assert_eq!(starts, vec![json!("2024-06-01"), json!("2024-02-15")]);
    }

    #[tokio::test]
    async fn update_and_delete_require_an_existing_document() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();
        assert!(matches!(
            store.update("packages", missing, json!({})).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete("packages", missing).await,
            Err(StoreError::NotFound { .. })
        ));

        let id = store.insert("packages", json!({ "n": 1 })).await.unwrap();
        store.update("packages", id, json!({ "n": 2 })).await.unwrap();
        assert_eq!(store.get("packages", id).await.unwrap().unwrap().data, json!({ "n": 2 }));
        store.delete("packages", id).await.unwrap();
        assert_eq!(store.count("packages").await.unwrap(), 0);
    }
}
