//! Store driver abstraction.
//!
//! This module defines the single capability-tagged trait that all storage
//! drivers implement. Instead of a family of store-variant interfaces, one
//! [`StoreDriver`] trait is paired with a [`Capabilities`] set that the
//! template checks at call time; a missing capability surfaces as
//! [`TemplateError::Unsupported`](crate::error::TemplateError::Unsupported)
//! before any store work is issued.
//!
//! # Row streams
//!
//! [`StoreDriver::execute`] yields a [`RowStream`]: a lazy, finite,
//! single-pass sequence of raw documents mirroring a store cursor. Consuming
//! it twice requires re-executing the query; dropping it releases the
//! cursor.

use async_trait::async_trait;
use bson::{Document, Uuid};
use futures::stream::BoxStream;
use std::{collections::HashSet, fmt::Debug};

use crate::{
    error::TemplateResult,
    translate::{NativeDeleteQuery, NativeQuery},
};

/// A lazy, single-pass sequence of raw result documents.
pub type RowStream = BoxStream<'static, TemplateResult<Document>>;

/// An optional feature of a storage driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Collection-level counts.
    Count,
    /// Ordered comparisons (`gt`, `gte`, `lt`, `lte`).
    Compare,
    /// Substring and prefix/suffix matching (`contains`, `starts_with`,
    /// `ends_with`).
    TextMatch,
    /// Set membership (`in`, `not_in`).
    Membership,
    /// Field existence checks.
    Existence,
    /// Logical negation of a sub-filter.
    Negation,
}

/// The set of optional features a driver supports.
///
/// Equality filtering is the baseline every driver must provide and is not
/// represented here. Everything else is opt-in and checked before the
/// driver is called.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    set: HashSet<Capability>,
}

impl Capabilities {
    /// Creates an empty capability set (equality filtering only).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a capability set with every capability enabled.
    pub fn all() -> Self {
        Self {
            set: HashSet::from([
                Capability::Count,
                Capability::Compare,
                Capability::TextMatch,
                Capability::Membership,
                Capability::Existence,
                Capability::Negation,
            ]),
        }
    }

    /// Adds a capability to the set.
    pub fn with(mut self, capability: Capability) -> Self {
        self.set.insert(capability);
        self
    }

    /// Removes a capability from the set.
    pub fn without(mut self, capability: Capability) -> Self {
        self.set.remove(&capability);
        self
    }

    /// Returns whether the driver supports the given capability.
    pub fn supports(&self, capability: Capability) -> bool {
        self.set.contains(&capability)
    }
}

/// Abstract interface for storage drivers.
///
/// A driver executes translated queries against one concrete store. The
/// template treats it as an opaque capability set plus four operations; the
/// driver never sees entity types, only documents.
///
/// # Thread safety
///
/// Implementations must be safe for concurrent invocation from multiple
/// async tasks. No method spawns background work; callers wanting
/// asynchronous fan-out wrap these contracts in their own executor layer.
///
/// # Error handling
///
/// Store and transport failures are surfaced as
/// [`TemplateError::Driver`](crate::error::TemplateError::Driver) and passed
/// through without retry.
#[async_trait]
pub trait StoreDriver: Send + Sync + Debug {
    /// Returns the optional features this driver supports.
    fn capabilities(&self) -> Capabilities;

    /// Executes a translated query and returns a lazy stream of raw rows.
    ///
    /// The stream is finite and single-pass; consuming it twice requires
    /// re-executing the query.
    async fn execute(&self, query: NativeQuery) -> TemplateResult<RowStream>;

    /// Removes every document matching a translated delete query.
    ///
    /// The affected count is not reported; the operation is observable only
    /// through subsequent reads.
    async fn execute_delete(&self, query: NativeDeleteQuery) -> TemplateResult<()>;

    /// Returns the number of documents in a collection.
    ///
    /// Only called when [`Capability::Count`] is advertised.
    async fn count(&self, collection: &str) -> TemplateResult<u64>;

    /// Returns the number of documents matching a translated query, if the
    /// store can report it without materializing results.
    ///
    /// The query's window (skip/limit) is ignored. The default reports
    /// `None`, which the template surfaces as an unknown total.
    async fn count_matching(&self, query: NativeQuery) -> TemplateResult<Option<u64>> {
        let _ = query;
        Ok(None)
    }

    /// Inserts a new document into a collection.
    async fn insert(
        &self,
        collection: &str,
        id: Uuid,
        document: Document,
    ) -> TemplateResult<()>;

    /// Replaces an existing document in a collection.
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        document: Document,
    ) -> TemplateResult<()>;
}

#[async_trait]
impl<D> StoreDriver for &D
where
    D: StoreDriver,
{
    fn capabilities(&self) -> Capabilities {
        (*self).capabilities()
    }

    async fn execute(&self, query: NativeQuery) -> TemplateResult<RowStream> {
        (*self).execute(query).await
    }

    async fn execute_delete(&self, query: NativeDeleteQuery) -> TemplateResult<()> {
        (*self).execute_delete(query).await
    }

    async fn count(&self, collection: &str) -> TemplateResult<u64> {
        (*self).count(collection).await
    }

    async fn count_matching(&self, query: NativeQuery) -> TemplateResult<Option<u64>> {
        (*self).count_matching(query).await
    }

    async fn insert(
        &self,
        collection: &str,
        id: Uuid,
        document: Document,
    ) -> TemplateResult<()> {
        (*self)
            .insert(collection, id, document)
            .await
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        document: Document,
    ) -> TemplateResult<()> {
        (*self)
            .update(collection, id, document)
            .await
    }
}

/// Factory trait for creating driver instances.
#[async_trait]
pub trait StoreDriverBuilder {
    type Driver: StoreDriver;

    async fn build(self) -> TemplateResult<Self::Driver>;
}
