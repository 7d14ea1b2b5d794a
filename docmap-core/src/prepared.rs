//! Prepared statements: bind-then-execute query templates.
//!
//! A prepared statement wraps a [`Query`](crate::query::Query) containing
//! named placeholders (see
//! [`Filter::param`](crate::query::Filter::param)). Bindings accumulate on
//! the statement and are resolved at translate time on every execution, so
//! one statement can be bound and executed many times. The template does
//! not cache statements; the caller owns them.
//!
//! # Example
//!
//! ```ignore
//! use docmap::query::{Query, Filter, FieldOp};
//!
//! let statement = template
//!     .prepare::<Person>(
//!         Query::builder()
//!             .filter(Filter::param("name", FieldOp::Eq, "who"))
//!             .build(),
//!     )
//!     .bind("who", "Alice");
//!
//! let alice = statement.single_result().await?;
//! ```

use bson::Bson;
use std::{collections::HashMap, marker::PhantomData};

use crate::{
    driver::StoreDriver,
    entity::Entity,
    error::TemplateResult,
    query::Query,
    template::{DocumentTemplate, EntityStream},
};

/// A query template with named placeholder parameters.
///
/// Created through
/// [`DocumentTemplate::prepare`](crate::template::DocumentTemplate::prepare).
/// Executing with an unbound placeholder fails with an invalid-argument
/// error at translate time, before the driver is called.
pub struct PreparedStatement<'a, D: StoreDriver, T: Entity> {
    template: &'a DocumentTemplate<D>,
    query: Query,
    bindings: HashMap<String, Bson>,
    _entity: PhantomData<fn() -> T>,
}

impl<'a, D: StoreDriver, T: Entity> PreparedStatement<'a, D, T> {
    pub(crate) fn new(template: &'a DocumentTemplate<D>, query: Query) -> Self {
        Self {
            template,
            query,
            bindings: HashMap::new(),
            _entity: PhantomData,
        }
    }

    /// Binds a value to a named placeholder, replacing any earlier binding
    /// of the same name.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    /// Executes the statement and streams the matching entities.
    pub async fn result(&self) -> TemplateResult<EntityStream<T>> {
        self.template
            .select_bound(&self.query, Some(&self.bindings))
            .await
    }

    /// Executes the statement expecting at most one match.
    pub async fn single_result(&self) -> TemplateResult<Option<T>> {
        self.template
            .single_result_bound(&self.query, Some(&self.bindings))
            .await
    }
}
