//! In-memory store driver.
//!
//! This module provides a thread-safe in-memory driver that stores
//! documents per collection in insertion order, evaluating filters with the
//! [`evaluator`](crate::evaluator) engine. Capabilities are configurable,
//! so capability-gated template behavior (e.g. a store without counts) is
//! reproducible in tests.

use async_trait::async_trait;
use bson::{Document, Uuid};
use futures::StreamExt;
use mea::rwlock::RwLock;
use std::{cmp::Ordering, collections::HashMap, sync::Arc};
use tracing::debug;

use docmap_core::{
    driver::{Capabilities, Capability, RowStream, StoreDriver, StoreDriverBuilder},
    error::{TemplateError, TemplateResult},
    query::SortDirection,
    translate::{NativeDeleteQuery, NativeQuery},
};

use crate::evaluator::{Comparable, DocumentEvaluator};

/// Documents of one collection, in insertion order.
type CollectionVec = Vec<(String, Document)>;
type StoreMap = HashMap<String, CollectionVec>;

/// Thread-safe in-memory store driver.
///
/// Documents are held per collection in insertion order, so selects without
/// sort keys observe store order. The driver is cloneable; clones share the
/// same underlying data through an `Arc`.
///
/// Queries scan the whole collection (no indexing), which is fine for the
/// development and test datasets this driver is meant for.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::InMemoryDriver;
/// use docmap_core::driver::{Capabilities, Capability};
///
/// // A driver that cannot count, for exercising capability checks.
/// let driver = InMemoryDriver::builder()
///     .capabilities(Capabilities::all().without(Capability::Count))
///     .build()
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryDriver {
    store: Arc<RwLock<StoreMap>>,
    capabilities: Capabilities,
}

impl Default for InMemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDriver {
    /// Creates an empty driver advertising every capability.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            capabilities: Capabilities::all(),
        }
    }

    /// Creates a builder for a driver with custom capabilities.
    pub fn builder() -> InMemoryDriverBuilder {
        InMemoryDriverBuilder::default()
    }

    async fn matching(
        &self,
        collection: &str,
        filter: Option<&docmap_core::query::Expr>,
    ) -> TemplateResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(documents) => documents,
            None => return Ok(vec![]),
        };

        let mut matched = Vec::new();
        for (_, document) in documents {
            let keep = match filter {
                Some(expr) => DocumentEvaluator::new(document).evaluate(expr)?,
                None => true,
            };
            if keep {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }
}

#[async_trait]
impl StoreDriver for InMemoryDriver {
    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    async fn execute(&self, query: NativeQuery) -> TemplateResult<RowStream> {
        let mut documents = self
            .matching(&query.collection, query.filter.as_ref())
            .await?;

        if !query.sort.is_empty() {
            documents.sort_by(|a, b| {
                for sort in &query.sort {
                    let left = a
                        .get(&sort.field)
                        .map(Comparable::from)
                        .unwrap_or(Comparable::Null);
                    let right = b
                        .get(&sort.field)
                        .map(Comparable::from)
                        .unwrap_or(Comparable::Null);

                    let ordering = match sort.direction {
                        SortDirection::Asc => left.partial_cmp(&right),
                        SortDirection::Desc => right.partial_cmp(&left),
                    }
                    .unwrap_or(Ordering::Equal);

                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }

                Ordering::Equal
            });
        }

        debug!(
            collection = %query.collection,
            matched = documents.len(),
            "executing query"
        );

        let rows: Vec<TemplateResult<Document>> = documents
            .into_iter()
            .skip(query.skip.unwrap_or(0) as usize)
            .take(query.limit.unwrap_or(u64::MAX) as usize)
            .map(Ok)
            .collect();

        Ok(futures::stream::iter(rows).boxed())
    }

    async fn execute_delete(&self, query: NativeDeleteQuery) -> TemplateResult<()> {
        let mut store = self.store.write().await;
        let documents = match store.get_mut(&query.collection) {
            Some(documents) => documents,
            None => return Ok(()),
        };

        match &query.filter {
            None => documents.clear(),
            Some(expr) => {
                let mut retained = Vec::with_capacity(documents.len());
                for (id, document) in documents.drain(..) {
                    if !DocumentEvaluator::new(&document).evaluate(expr)? {
                        retained.push((id, document));
                    }
                }
                *documents = retained;
            }
        }

        Ok(())
    }

    async fn count(&self, collection: &str) -> TemplateResult<u64> {
        let store = self.store.read().await;

        Ok(store
            .get(collection)
            .map(|documents| documents.len() as u64)
            .unwrap_or(0))
    }

    async fn count_matching(&self, query: NativeQuery) -> TemplateResult<Option<u64>> {
        if !self.capabilities.supports(Capability::Count) {
            return Ok(None);
        }

        // The window does not affect the total.
        let matched = self
            .matching(&query.collection, query.filter.as_ref())
            .await?;

        Ok(Some(matched.len() as u64))
    }

    async fn insert(
        &self,
        collection: &str,
        id: Uuid,
        document: Document,
    ) -> TemplateResult<()> {
        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();
        let key = id.to_string();

        if documents.iter().any(|(existing, _)| existing == &key) {
            return Err(TemplateError::Driver(format!(
                "document {key} already exists in collection {collection}",
            )));
        }

        documents.push((key, document));

        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        document: Document,
    ) -> TemplateResult<()> {
        let mut store = self.store.write().await;
        let documents = match store.get_mut(collection) {
            Some(documents) => documents,
            None => {
                return Err(TemplateError::Driver(format!(
                    "collection {collection} not found",
                )));
            }
        };
        let key = id.to_string();

        match documents
            .iter_mut()
            .find(|(existing, _)| existing == &key)
        {
            Some(slot) => {
                slot.1 = document;
                Ok(())
            }
            None => Err(TemplateError::Driver(format!(
                "document {key} not found in collection {collection}",
            ))),
        }
    }
}

/// Builder for [`InMemoryDriver`] instances.
#[derive(Debug)]
pub struct InMemoryDriverBuilder {
    capabilities: Capabilities,
}

impl Default for InMemoryDriverBuilder {
    fn default() -> Self {
        Self { capabilities: Capabilities::all() }
    }
}

impl InMemoryDriverBuilder {
    /// Sets the capabilities the driver will advertise.
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

#[async_trait]
impl StoreDriverBuilder for InMemoryDriverBuilder {
    type Driver = InMemoryDriver;

    async fn build(self) -> TemplateResult<Self::Driver> {
        Ok(InMemoryDriver {
            store: Arc::new(RwLock::new(StoreMap::new())),
            capabilities: self.capabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docmap_core::query::{Filter, Sort, SortDirection};
    use futures::TryStreamExt;

    fn native(collection: &str) -> NativeQuery {
        NativeQuery {
            collection: collection.to_string(),
            filter: None,
            sort: vec![],
            skip: None,
            limit: None,
        }
    }

    async fn seeded() -> InMemoryDriver {
        let driver = InMemoryDriver::new();
        for (name, age) in [("Alice", 30), ("Bob", 25), ("Carol", 35)] {
            driver
                .insert("people", Uuid::new(), doc! { "name": name, "age": age })
                .await
                .unwrap();
        }
        driver
    }

    #[tokio::test]
    async fn execute_preserves_insertion_order() {
        let driver = seeded().await;

        let rows: Vec<Document> = driver
            .execute(native("people"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let names: Vec<&str> = rows
            .iter()
            .map(|d| d.get_str("name").unwrap())
            .collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
    }

    #[tokio::test]
    async fn filter_sort_and_window_compose() {
        let driver = seeded().await;

        let mut query = native("people");
        query.filter = Some(Filter::gt("age", 20));
        query.sort = vec![Sort {
            field: "age".to_string(),
            direction: SortDirection::Desc,
        }];
        query.limit = Some(2);

        let rows: Vec<Document> = driver
            .execute(query)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let names: Vec<&str> = rows
            .iter()
            .map(|d| d.get_str("name").unwrap())
            .collect();
        assert_eq!(names, ["Carol", "Alice"]);
    }

    #[tokio::test]
    async fn missing_collection_yields_no_rows() {
        let driver = InMemoryDriver::new();

        let rows: Vec<Document> = driver
            .execute(native("nothing"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_only_matching_documents() {
        let driver = seeded().await;

        driver
            .execute_delete(NativeDeleteQuery {
                collection: "people".to_string(),
                filter: Some(Filter::eq("name", "Bob")),
            })
            .await
            .unwrap();

        assert_eq!(driver.count("people").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_driver_error() {
        let driver = InMemoryDriver::new();
        let id = Uuid::new();

        driver
            .insert("people", id, doc! { "name": "Alice" })
            .await
            .unwrap();
        let result = driver
            .insert("people", id, doc! { "name": "Alice" })
            .await;

        assert!(matches!(result, Err(TemplateError::Driver(_))));
    }

    #[tokio::test]
    async fn update_replaces_the_stored_document() {
        let driver = InMemoryDriver::new();
        let id = Uuid::new();

        driver
            .insert("people", id, doc! { "name": "Alice", "age": 30 })
            .await
            .unwrap();
        driver
            .update("people", id, doc! { "name": "Alice", "age": 31 })
            .await
            .unwrap();

        let rows: Vec<Document> = driver
            .execute(native("people"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(rows[0].get_i32("age").unwrap(), 31);
    }

    #[tokio::test]
    async fn count_matching_respects_the_capability_set() {
        let counting = seeded().await;
        assert_eq!(
            counting
                .count_matching(native("people"))
                .await
                .unwrap(),
            Some(3)
        );

        let countless = InMemoryDriver::builder()
            .capabilities(Capabilities::all().without(Capability::Count))
            .build()
            .await
            .unwrap();
        assert_eq!(
            countless
                .count_matching(native("people"))
                .await
                .unwrap(),
            None
        );
    }
}
