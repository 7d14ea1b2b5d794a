//! In-memory store driver for docmap.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreDriver` trait. It uses async-aware read-write locks for concurrent
//! access and is ideal for development and testing, including tests that
//! exercise capability-gated template behavior against a deliberately
//! restricted driver.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Insertion-order storage** - Selects without sort keys observe store order
//! - **Full filter support** - Every filter operator is evaluated in process
//! - **Configurable capabilities** - Advertise any subset of optional features
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryDriver};
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
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn collection_name() -> &'static str { "people" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let template = DocumentTemplate::new(InMemoryDriver::new());
//!
//!     let person = Person {
//!         id: Uuid::new(),
//!         name: "Alice".to_string(),
//!     };
//!
//!     template.insert(&person).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_memory;

pub mod driver;
pub mod evaluator;

pub use driver::{InMemoryDriver, InMemoryDriverBuilder};
