//! Main docmap crate providing a unified interface for document mapping.
//!
//! This crate is the primary entry point for users of the docmap framework.
//! It re-exports the core types and functionality from various sub-crates and
//! provides convenient access to the bundled storage drivers.
//!
//! # Features
//!
//! - **Type-safe document mapping** - Define your data structures with Serde
//!   and convert them to and from schemaless documents
//! - **Pluggable drivers** - A single capability-tagged driver trait with an
//!   in-memory implementation included
//! - **Flexible querying** - Powerful, composable query API for filtering,
//!   sorting, and pagination with lazy result streams
//! - **Prepared statements** - Reusable query templates with named parameters
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryDriver};
//! use bson::Uuid;
//! use futures::TryStreamExt;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Person {
//!     pub id: Uuid,
//!     pub name: String,
//! }
//!
//! impl Entity for Person {
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn collection_name() -> &'static str { "people" }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let template = DocumentTemplate::new(InMemoryDriver::new());
//!
//!     let person = Person {
//!         id: Uuid::new(),
//!         name: "Alice".to_string(),
//!     };
//!
//!     // Insert the person
//!     template.insert(&person).await.unwrap();
//!
//!     // Query for the person
//!     let people: Vec<Person> = template
//!         .select(
//!             Query::builder()
//!                 .filter(Filter::eq("name", "Alice"))
//!                 .build(),
//!         )
//!         .await
//!         .unwrap()
//!         .try_collect()
//!         .await
//!         .unwrap();
//!
//!     println!("Queried people: {:?}", people);
//! }
//! ```
//!
//! # Pagination
//!
//! Paged selects return a materialized [`Page`](page::Page) carrying the
//! window plus navigation hints. The total element count is reported only
//! when the driver can count; otherwise it is stated as unknown rather than
//! guessed.
//!
//! ```ignore
//! use docmap::prelude::*;
//!
//! let request = PageRequest::new(1, 20)?;
//! let page = template.select_page::<Person>(query, request).await?;
//!
//! for person in &page.items {
//!     println!("{}", person.name);
//! }
//! if let Some(next) = page.next_page {
//!     // fetch the next window with `next`
//! }
//! ```
//!
//! # Drivers
//!
//! - [`memory`] - Fast in-memory storage for development and testing

pub mod prelude;

pub use docmap_core::{codec, driver, entity, error, page, prepared, query, template, translate};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage driver implementations.
pub mod memory {
    pub use docmap_memory::{InMemoryDriver, InMemoryDriverBuilder};
}
