//! A document-mapping template engine that translates typed domain objects
//! to and from a schemaless document representation over pluggable store
//! drivers.
//!
//! This crate is the core of the docmap project and provides:
//!
//! - **Entity model** ([`entity`]) - The `Entity` trait, per-type
//!   descriptors, and the process-wide descriptor registry
//! - **Document codec** ([`codec`]) - Pure conversion between entities and
//!   BSON documents
//! - **Query API** ([`query`]) - Type-safe query and delete-query
//!   construction with a visitor for traversal
//! - **Query translation** ([`translate`]) - Rewriting caller queries into
//!   the driver-executable native form with capability checks
//! - **Driver abstraction** ([`driver`]) - The capability-tagged
//!   `StoreDriver` trait and lazy row streams
//! - **Pagination** ([`page`]) - Validated page requests and materialized
//!   result pages
//! - **Template façade** ([`template`]) - delete/select/count/single-result
//!   operations with cardinality enforcement
//! - **Prepared statements** ([`prepared`]) - Bind-then-execute query
//!   templates
//! - **Error handling** ([`error`]) - The shared error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use docmap_core::entity::Entity;
//! use bson::Uuid;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Person {
//!     pub id: Uuid,
//!     pub name: String,
//! }
//!
//! impl Entity for Person {
//!     fn id(&self) -> &Uuid {
//!         &self.id
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "people"
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_core;

pub mod codec;
pub mod driver;
pub mod entity;
pub mod error;
pub mod page;
pub mod prepared;
pub mod query;
pub mod template;
pub mod translate;
