//! Convenient re-exports of commonly used types from docmap.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```
//!
//! This provides access to:
//! - The entity trait and document codec
//! - The template façade and prepared statements
//! - Store driver traits and capability sets
//! - Query construction and filtering
//! - Pagination types
//! - Error types

pub use docmap_core::{
    codec::DocumentCodec,
    driver::{Capabilities, Capability, RowStream, StoreDriver, StoreDriverBuilder},
    entity::Entity,
    error::{TemplateError, TemplateResult},
    page::{Page, PageRequest, TotalElements},
    prepared::PreparedStatement,
    query::{
        DeleteQuery, DeleteQueryBuilder, Expr, FieldOp, Filter, Operand, Query, QueryBuilder,
        QueryVisitor, Sort, SortDirection,
    },
    template::{DocumentTemplate, EntityStream},
    translate::{NativeDeleteQuery, NativeQuery, QueryTranslator},
};
