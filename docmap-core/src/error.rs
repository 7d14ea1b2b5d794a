//! Error types and result types for template operations.
//!
//! This module provides the error taxonomy shared by every operation in the
//! mapping engine. Use [`TemplateResult<T>`] as the return type for fallible
//! operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the document-mapping template.
///
/// Each variant identifies who is at fault: `InvalidArgument` and `Mapping`
/// are caller/model bugs and are never worth retrying, `Unsupported` reports
/// a missing driver capability, `NonUniqueResult` is the cardinality failure
/// of single-result reads, and `Driver` carries store failures through
/// unmodified.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// A required argument is absent or structurally invalid (blank
    /// collection name, zero page size, unbound query parameter).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The codec could not convert between an entity and its document form
    /// (unrepresentable field type, nesting depth exceeded, missing
    /// identifier field).
    #[error("Mapping error: {0}")]
    Mapping(String),
    /// The store driver lacks a capability the operation requires. The
    /// message names the specific operator or capability.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    /// A single-result read matched more than one document. The argument is
    /// the collection name.
    #[error("Non-unique result: more than one document matched in collection {0}")]
    NonUniqueResult(String),
    /// An error surfaced by the underlying store driver, passed through
    /// without retry.
    #[error("Driver error: {0}")]
    Driver(String),
}

/// A specialized `Result` type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

impl From<BsonError> for TemplateError {
    fn from(err: BsonError) -> Self {
        TemplateError::Mapping(err.to_string())
    }
}

impl From<SerdeJsonError> for TemplateError {
    fn from(err: SerdeJsonError) -> Self {
        TemplateError::Mapping(err.to_string())
    }
}
