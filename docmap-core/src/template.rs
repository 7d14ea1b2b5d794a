//! The document template: the caller-facing façade of the mapping engine.
//!
//! [`DocumentTemplate`] composes the codec, translator and pagination over
//! one store driver. It is stateless between calls; each operation is an
//! independent interaction with the store, so a template can be shared
//! freely across tasks.
//!
//! # Example
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryDriver};
//!
//! let template = DocumentTemplate::new(InMemoryDriver::new());
//! template.insert(&person).await?;
//!
//! let mut people = template
//!     .select::<Person>(Query::builder().filter(Filter::eq("name", "Alice")).build())
//!     .await?;
//! while let Some(person) = people.try_next().await? {
//!     println!("{person:?}");
//! }
//! ```

use bson::Bson;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{
    codec::DocumentCodec,
    driver::{Capability, StoreDriver},
    entity::{DescriptorRegistry, Entity, EntityDescriptor},
    error::{TemplateError, TemplateResult},
    page::{Page, PageRequest, TotalElements},
    prepared::PreparedStatement,
    query::{DeleteQuery, Query},
    translate::QueryTranslator,
};

/// A lazy, finite, single-pass sequence of typed results.
///
/// Rows decode as they are pulled, so a mapping failure on row N surfaces
/// when row N is consumed. Dropping the stream releases the underlying
/// cursor; a stream is not restartable once consumed.
pub type EntityStream<T> = BoxStream<'static, TemplateResult<T>>;

/// Façade over a store driver with integrated object-document mapping.
///
/// The template holds the driver, the codec, and the process-wide descriptor
/// registry; none of them mutate per call, so concurrent use needs no
/// external synchronization.
#[derive(Debug)]
pub struct DocumentTemplate<D: StoreDriver> {
    driver: D,
    codec: DocumentCodec,
    registry: DescriptorRegistry,
}

impl<D: StoreDriver> DocumentTemplate<D> {
    /// Creates a template over the given driver with the default codec.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            codec: DocumentCodec::new(),
            registry: DescriptorRegistry::new(),
        }
    }

    /// Creates a template with a custom codec.
    pub fn with_codec(driver: D, codec: DocumentCodec) -> Self {
        Self {
            driver,
            codec,
            registry: DescriptorRegistry::new(),
        }
    }

    /// Returns a reference to the underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn descriptor<T: Entity>(&self) -> Arc<EntityDescriptor> {
        self.registry.descriptor::<T>()
    }

    /// Inserts an entity into its collection.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Mapping`] if encoding fails, or the driver's
    /// error if the store rejects the insert.
    pub async fn insert<T: Entity>(&self, entity: &T) -> TemplateResult<()> {
        let descriptor = self.descriptor::<T>();
        let document = self.codec.to_document(entity, &descriptor)?;

        debug!(collection = descriptor.collection(), "inserting entity");
        self.driver
            .insert(descriptor.collection(), *entity.id(), document)
            .await
    }

    /// Inserts several entities into their collection.
    pub async fn insert_many<T: Entity>(&self, entities: &[T]) -> TemplateResult<()> {
        for entity in entities {
            self.insert(entity).await?;
        }

        Ok(())
    }

    /// Replaces an existing entity in its collection.
    ///
    /// Updating an id the store does not hold is a driver error, passed
    /// through unmodified.
    pub async fn update<T: Entity>(&self, entity: &T) -> TemplateResult<()> {
        let descriptor = self.descriptor::<T>();
        let document = self.codec.to_document(entity, &descriptor)?;

        debug!(collection = descriptor.collection(), "updating entity");
        self.driver
            .update(descriptor.collection(), *entity.id(), document)
            .await
    }

    /// Finds entities matching a query.
    ///
    /// Returns a lazy, single-pass stream; each pulled row is decoded
    /// through the codec. Without explicit sort keys, order is
    /// store-defined.
    pub async fn select<T: Entity>(&self, query: Query) -> TemplateResult<EntityStream<T>> {
        self.select_bound(&query, None).await
    }

    /// Finds entities matching a query, one pagination window at a time.
    ///
    /// Sets offset and limit from the request on a copy of the query and
    /// materializes the window eagerly. The returned page never holds more
    /// than the requested size; its total is reported as unknown unless the
    /// store can count matches.
    pub async fn select_page<T: Entity>(
        &self,
        query: Query,
        request: PageRequest,
    ) -> TemplateResult<Page<T>> {
        let descriptor = self.descriptor::<T>();
        let capabilities = self.driver.capabilities();
        let translator = QueryTranslator::new(&descriptor, &capabilities);
        let mut native = translator.translate(&query)?;

        let total = if capabilities.supports(Capability::Count) {
            match self.driver.count_matching(native.clone()).await? {
                Some(total) => TotalElements::Known(total),
                None => TotalElements::Unknown,
            }
        } else {
            TotalElements::Unknown
        };

        native.skip = Some(request.offset());
        native.limit = Some(request.size());

        debug!(
            collection = descriptor.collection(),
            page = request.page(),
            size = request.size(),
            "executing paged select"
        );
        let rows = self.driver.execute(native).await?;
        let codec = self.codec;
        let items = rows
            .map(move |row| row.and_then(|document| codec.from_document::<T>(document, &descriptor)))
            .try_collect::<Vec<T>>()
            .await?;

        Ok(Page::from_window(items, request, total))
    }

    /// Removes every document matching a delete query.
    ///
    /// The affected count is not observable by contract; callers needing it
    /// must count before deleting.
    pub async fn delete<T: Entity>(&self, query: DeleteQuery) -> TemplateResult<()> {
        let descriptor = self.descriptor::<T>();
        let capabilities = self.driver.capabilities();
        let translator = QueryTranslator::new(&descriptor, &capabilities);
        let native = translator.translate_delete(&query)?;

        debug!(collection = descriptor.collection(), "executing delete");
        self.driver.execute_delete(native).await
    }

    /// Returns the number of documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidArgument`] for a blank name and
    /// [`TemplateError::Unsupported`] when the driver cannot count; neither
    /// issues a store call.
    pub async fn count(&self, collection: &str) -> TemplateResult<u64> {
        if collection.trim().is_empty() {
            return Err(TemplateError::InvalidArgument(
                "collection name must not be blank".to_string(),
            ));
        }
        if !self
            .driver
            .capabilities()
            .supports(Capability::Count)
        {
            return Err(TemplateError::Unsupported(
                "driver does not support collection counts (Count capability missing)".to_string(),
            ));
        }

        self.driver.count(collection).await
    }

    /// Returns the number of documents in the collection of `T`.
    pub async fn count_of<T: Entity>(&self) -> TemplateResult<u64> {
        let descriptor = self.descriptor::<T>();

        self.count(descriptor.collection()).await
    }

    /// Returns the unique entity matching a query, if any.
    ///
    /// Reads at most two rows: zero rows yield `None`, exactly one yields
    /// the entity, a second row short-circuits with
    /// [`TemplateError::NonUniqueResult`] without draining the rest.
    pub async fn single_result<T: Entity>(&self, query: Query) -> TemplateResult<Option<T>> {
        self.single_result_bound(&query, None).await
    }

    /// Prepares a query with named placeholders for repeated execution.
    pub fn prepare<T: Entity>(&self, query: Query) -> PreparedStatement<'_, D, T> {
        PreparedStatement::new(self, query)
    }

    pub(crate) async fn select_bound<T: Entity>(
        &self,
        query: &Query,
        bindings: Option<&HashMap<String, Bson>>,
    ) -> TemplateResult<EntityStream<T>> {
        let descriptor = self.descriptor::<T>();
        let capabilities = self.driver.capabilities();
        let native = match bindings {
            Some(bindings) => {
                QueryTranslator::with_bindings(&descriptor, &capabilities, bindings)
                    .translate(query)?
            }
            None => QueryTranslator::new(&descriptor, &capabilities).translate(query)?,
        };

        debug!(collection = descriptor.collection(), "executing select");
        let rows = self.driver.execute(native).await?;
        let codec = self.codec;

        Ok(rows
            .map(move |row| row.and_then(|document| codec.from_document::<T>(document, &descriptor)))
            .boxed())
    }

    pub(crate) async fn single_result_bound<T: Entity>(
        &self,
        query: &Query,
        bindings: Option<&HashMap<String, Bson>>,
    ) -> TemplateResult<Option<T>> {
        // Cap the window at two rows; uniqueness needs no more. A caller
        // limit tighter than two stays in force.
        let mut probe = query.clone();
        probe.limit = Some(query.limit.map_or(2, |limit| limit.min(2)));

        let mut rows = self
            .select_bound::<T>(&probe, bindings)
            .await?;

        let first = match rows.next().await {
            None => return Ok(None),
            Some(row) => row?,
        };

        match rows.next().await {
            None => Ok(Some(first)),
            Some(Err(e)) => Err(e),
            Some(Ok(_)) => {
                let descriptor = self.descriptor::<T>();
                Err(TemplateError::NonUniqueResult(
                    descriptor.collection().to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        driver::{Capabilities, RowStream},
        query::Filter,
        translate::{NativeDeleteQuery, NativeQuery},
    };
    use async_trait::async_trait;
    use bson::{Document, Uuid, doc};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Person {
        id: Uuid,
        name: String,
    }

    impl Entity for Person {
        fn id(&self) -> &Uuid {
            &self.id
        }

        fn collection_name() -> &'static str {
            "people"
        }
    }

    /// Driver stub that replays canned rows and records every call.
    #[derive(Debug, Default)]
    struct ScriptedDriver {
        rows: Vec<Document>,
        row_error: Option<String>,
        capabilities: Capabilities,
        count: u64,
        executed: Mutex<Vec<NativeQuery>>,
        deletes: Mutex<Vec<NativeDeleteQuery>>,
        inserted: Mutex<Vec<(String, Document)>>,
        counted: Mutex<Vec<String>>,
    }

    impl ScriptedDriver {
        fn with_rows(rows: Vec<Document>) -> Self {
            Self {
                rows,
                capabilities: Capabilities::all(),
                ..Self::default()
            }
        }

        fn without_count(mut self) -> Self {
            self.capabilities = Capabilities::all().without(Capability::Count);
            self
        }

        /// Makes every result stream end in a driver error, as a cursor
        /// whose fetch fails mid-iteration would.
        fn failing_after_rows(mut self, message: &str) -> Self {
            self.row_error = Some(message.to_string());
            self
        }
    }

    #[async_trait]
    impl StoreDriver for ScriptedDriver {
        fn capabilities(&self) -> Capabilities {
            self.capabilities.clone()
        }

        async fn execute(&self, query: NativeQuery) -> TemplateResult<RowStream> {
            let skip = query.skip.unwrap_or(0) as usize;
            let take = query.limit.unwrap_or(u64::MAX) as usize;
            self.executed.lock().unwrap().push(query);

            let mut rows: Vec<_> = self
                .rows
                .iter()
                .skip(skip)
                .take(take)
                .cloned()
                .map(Ok)
                .collect();
            if let Some(message) = &self.row_error {
                rows.push(Err(TemplateError::Driver(message.clone())));
            }

            Ok(futures::stream::iter(rows).boxed())
        }

        async fn execute_delete(&self, query: NativeDeleteQuery) -> TemplateResult<()> {
            self.deletes.lock().unwrap().push(query);

            Ok(())
        }

        async fn count(&self, collection: &str) -> TemplateResult<u64> {
            self.counted
                .lock()
                .unwrap()
                .push(collection.to_string());

            Ok(self.count)
        }

        async fn count_matching(&self, _query: NativeQuery) -> TemplateResult<Option<u64>> {
            Ok(Some(self.rows.len() as u64))
        }

        async fn insert(
            &self,
            collection: &str,
            _id: Uuid,
            document: Document,
        ) -> TemplateResult<()> {
            self.inserted
                .lock()
                .unwrap()
                .push((collection.to_string(), document));

            Ok(())
        }

        async fn update(
            &self,
            _collection: &str,
            _id: Uuid,
            _document: Document,
        ) -> TemplateResult<()> {
            Ok(())
        }
    }

    fn person_row(name: &str) -> Document {
        doc! { "id": Uuid::new(), "name": name }
    }

    #[tokio::test]
    async fn select_decodes_each_row() {
        let driver = ScriptedDriver::with_rows(vec![person_row("Alice"), person_row("Bob")]);
        let template = DocumentTemplate::new(driver);

        let people: Vec<Person> = template
            .select::<Person>(Query::new())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(people.len(), 2);
        assert_eq!(people[0].name, "Alice");
    }

    #[tokio::test]
    async fn select_surfaces_mapping_error_on_the_bad_row() {
        // Second row is missing the identifier field.
        let driver =
            ScriptedDriver::with_rows(vec![person_row("Alice"), doc! { "name": "ghost" }]);
        let template = DocumentTemplate::new(driver);

        let mut rows = template
            .select::<Person>(Query::new())
            .await
            .unwrap();

        assert!(rows.next().await.unwrap().is_ok());
        assert!(matches!(
            rows.next().await.unwrap(),
            Err(TemplateError::Mapping(_))
        ));
    }

    #[tokio::test]
    async fn single_result_empty_yields_none() {
        let template = DocumentTemplate::new(ScriptedDriver::with_rows(vec![]));

        let result = template
            .single_result::<Person>(Query::new())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn single_result_returns_the_unique_row() {
        let template = DocumentTemplate::new(ScriptedDriver::with_rows(vec![person_row("Alice")]));

        let result = template
            .single_result::<Person>(Query::new())
            .await
            .unwrap();

        assert_eq!(result.unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn single_result_caps_the_query_at_two_rows() {
        let driver = ScriptedDriver::with_rows(vec![
            person_row("Alice"),
            person_row("Bob"),
            person_row("Carol"),
        ]);
        let template = DocumentTemplate::new(driver);

        let result = template
            .single_result::<Person>(Query::new())
            .await;

        assert!(matches!(result, Err(TemplateError::NonUniqueResult(_))));
        let executed = template.driver().executed.lock().unwrap();
        assert_eq!(executed[0].limit, Some(2));
    }

    #[tokio::test]
    async fn single_result_honors_a_caller_limit_of_one() {
        let driver = ScriptedDriver::with_rows(vec![
            person_row("Alice"),
            person_row("Bob"),
            person_row("Carol"),
        ]);
        let template = DocumentTemplate::new(driver);

        let result = template
            .single_result::<Person>(Query::builder().limit(1).build())
            .await
            .unwrap();

        assert_eq!(result.unwrap().name, "Alice");
        let executed = template.driver().executed.lock().unwrap();
        assert_eq!(executed[0].limit, Some(1));
    }

    #[tokio::test]
    async fn single_result_passes_a_second_row_error_through() {
        let driver = ScriptedDriver::with_rows(vec![person_row("Alice")])
            .failing_after_rows("cursor fetch failed");
        let template = DocumentTemplate::new(driver);

        let result = template
            .single_result::<Person>(Query::new())
            .await;

        match result {
            Err(TemplateError::Driver(message)) => {
                assert!(message.contains("cursor fetch failed"));
            }
            other => panic!("expected Driver, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn count_rejects_blank_names_without_a_store_call() {
        let template = DocumentTemplate::new(ScriptedDriver::with_rows(vec![]));

        let result = template.count("  ").await;

        assert!(matches!(result, Err(TemplateError::InvalidArgument(_))));
        assert!(template.driver().counted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_without_capability_is_unsupported() {
        let template =
            DocumentTemplate::new(ScriptedDriver::with_rows(vec![]).without_count());

        let result = template.count("people").await;

        assert!(matches!(result, Err(TemplateError::Unsupported(_))));
        assert!(template.driver().counted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_of_resolves_the_entity_collection() {
        let mut driver = ScriptedDriver::with_rows(vec![]);
        driver.count = 7;
        let template = DocumentTemplate::new(driver);

        assert_eq!(template.count_of::<Person>().await.unwrap(), 7);
        assert_eq!(
            template.driver().counted.lock().unwrap().as_slice(),
            ["people"]
        );
    }

    #[tokio::test]
    async fn select_page_windows_and_reports_the_total() {
        let driver = ScriptedDriver::with_rows(vec![
            person_row("Alice"),
            person_row("Bob"),
            person_row("Carol"),
        ]);
        let template = DocumentTemplate::new(driver);

        let page = template
            .select_page::<Person>(Query::new(), PageRequest::new(2, 2).unwrap())
            .await
            .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page.total_elements, TotalElements::Known(3));
        assert_eq!(page.previous_page, Some(1));
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn delete_translates_and_reaches_the_driver() {
        let template = DocumentTemplate::new(ScriptedDriver::with_rows(vec![]));

        template
            .delete::<Person>(
                DeleteQuery::builder()
                    .filter(Filter::eq("name", "Alice"))
                    .build(),
            )
            .await
            .unwrap();

        let deletes = template.driver().deletes.lock().unwrap();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].collection, "people");
    }

    #[tokio::test]
    async fn insert_encodes_through_the_codec() {
        let template = DocumentTemplate::new(ScriptedDriver::with_rows(vec![]));
        let person = Person { id: Uuid::new(), name: "Alice".to_string() };

        template.insert(&person).await.unwrap();

        let inserted = template.driver().inserted.lock().unwrap();
        assert_eq!(inserted[0].0, "people");
        assert_eq!(inserted[0].1.get_str("name").unwrap(), "Alice");
    }
}
