//! Query construction and filtering API.
//!
//! This module provides type-safe construction of selection queries
//! (filters, sort keys, limit/offset) and bulk-delete queries (filters
//! only), plus a visitor pattern used by the translator and by drivers.
//!
//! # Query building
//!
//! ```ignore
//! use docmap::query::{Query, Filter, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("name", "Alice"))
//!     .sort("created_at", SortDirection::Desc)
//!     .limit(10)
//!     .build();
//! ```
//!
//! # Filter expression API
//!
//! The [`Filter`] struct provides static methods for building filter
//! expressions:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`
//! - String: `starts_with`, `ends_with`, `contains`
//! - Existence: `exists`, `not_exists`
//! - Membership: `is_in`, `not_in`
//! - Logical: `and`, `or`
//! - Placeholders: `param` (bound later through a prepared statement)
//!
//! Expressions combine with the chainable `and`/`or`/`not` methods.

use bson::Bson;

use crate::error::TemplateError;

/// Sort direction for query results.
#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Sort specification for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// String or array contains value.
    Contains,
    /// String starts with value.
    StartsWith,
    /// String ends with value.
    EndsWith,
    /// Field value is one of the given values.
    In,
    /// Field value is none of the given values.
    NotIn,
}

impl FieldOp {
    /// Returns the operator name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldOp::Eq => "eq",
            FieldOp::Ne => "ne",
            FieldOp::Gt => "gt",
            FieldOp::Gte => "gte",
            FieldOp::Lt => "lt",
            FieldOp::Lte => "lte",
            FieldOp::Contains => "contains",
            FieldOp::StartsWith => "starts_with",
            FieldOp::EndsWith => "ends_with",
            FieldOp::In => "in",
            FieldOp::NotIn => "not_in",
        }
    }
}

/// Right-hand side of a field comparison: a literal value or a named
/// placeholder resolved when a prepared statement is executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal BSON value.
    Value(Bson),
    /// A named placeholder, bound through a prepared statement.
    Param(String),
}

/// A filter expression for selecting documents.
///
/// Expressions can be combined using logical operators (`And`, `Or`, `Not`)
/// to build complex filter predicates. Sub-expression order is significant
/// and preserved through translation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression (inverts the result).
    Not(Box<Expr>),
    /// Checks if a field exists or doesn't exist.
    Exists(String, bool),
    /// Field comparison expression.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value or placeholder to compare against.
        operand: Operand,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, operand: Operand) -> Self {
        Expr::Field { field, op, operand }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is
    /// appended to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// An immutable description of selection criteria.
///
/// Encapsulates a filter expression, sort keys, and a limit/offset window.
/// Built by the caller through [`QueryBuilder`] and consumed by the
/// translator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Sort keys applied in order.
    pub sort: Vec<Sort>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Number of documents to skip.
    pub offset: Option<u64>,
}

impl Query {
    /// Creates a new empty query with no filters or limits.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// A bulk-removal query, structurally restricted to filters only.
///
/// Unlike [`Query`], a delete query carries no sort keys, limit or offset;
/// its builder does not expose them, so an invalid delete cannot be
/// constructed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteQuery {
    /// Optional filter expression; absent means every document matches.
    pub filter: Option<Expr>,
}

impl DeleteQuery {
    /// Creates a delete query matching every document in the collection.
    pub fn new() -> Self {
        DeleteQuery::default()
    }

    /// Creates a new delete query builder.
    pub fn builder() -> DeleteQueryBuilder {
        DeleteQueryBuilder::new()
    }
}

/// Helper struct for constructing filter expressions.
///
/// Provides static methods to construct common filter expressions. All
/// methods accept field names as `Into<String>` and literal values as
/// `Into<Bson>`.
///
/// # Example
///
/// ```ignore
/// use docmap::query::Filter;
///
/// let expr = Filter::eq("name", "Alice")
///     .and(Filter::gt("age", 18));
/// ```
pub struct Filter;

impl Filter {
    /// Creates an equality filter expression.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, Operand::Value(value.into()))
    }

    /// Creates a not-equal filter expression.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, Operand::Value(value.into()))
    }

    /// Creates a greater-than filter expression.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, Operand::Value(value.into()))
    }

    /// Creates a greater-than-or-equal filter expression.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, Operand::Value(value.into()))
    }

    /// Creates a less-than filter expression.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, Operand::Value(value.into()))
    }

    /// Creates a less-than-or-equal filter expression.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, Operand::Value(value.into()))
    }

    /// Creates a contains filter expression (string or array membership).
    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, Operand::Value(value.into()))
    }

    /// Creates a string prefix filter expression.
    pub fn starts_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::StartsWith, Operand::Value(value.into()))
    }

    /// Creates a string suffix filter expression.
    pub fn ends_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::EndsWith, Operand::Value(value.into()))
    }

    /// Creates a membership filter expression.
    ///
    /// Matches documents where the field is any of the specified values.
    pub fn is_in(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::In, Operand::Value(values.into()))
    }

    /// Creates an exclusion filter expression.
    ///
    /// Matches documents where the field is none of the specified values.
    pub fn not_in(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NotIn, Operand::Value(values.into()))
    }

    /// Creates an existence filter expression.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Creates a non-existence filter expression.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// Creates a logical AND filter expression.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Creates a logical OR filter expression.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Creates a field comparison against a named placeholder.
    ///
    /// The placeholder is resolved when the query is executed through a
    /// prepared statement; executing it unbound fails with an
    /// invalid-argument error.
    pub fn param(field: impl Into<String>, op: FieldOp, name: impl Into<String>) -> Expr {
        Expr::field(field.into(), op, Operand::Param(name.into()))
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression for this query.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the number of documents to skip.
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Appends a sort key. Keys apply in the order they are added.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query
            .sort
            .push(Sort { field: field.into(), direction });
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct DeleteQueryBuilder {
    query: DeleteQuery,
}

impl DeleteQueryBuilder {
    /// Creates a new delete query builder.
    pub fn new() -> Self {
        DeleteQueryBuilder { query: DeleteQuery::default() }
    }

    /// Sets the filter expression for this delete query.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Builds and returns the final delete query.
    pub fn build(self) -> DeleteQuery {
        self.query
    }
}

impl Default for DeleteQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<TemplateError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        operand: &Operand,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, operand } => self.visit_field(field, op, operand),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_sort_keys_in_order() {
        let query = Query::builder()
            .filter(Filter::eq("status", "active"))
            .sort("age", SortDirection::Desc)
            .sort("name", SortDirection::Asc)
            .limit(5)
            .offset(10)
            .build();

        assert_eq!(query.sort.len(), 2);
        assert_eq!(query.sort[0].field, "age");
        assert_eq!(query.sort[1].field, "name");
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, Some(10));
    }

    #[test]
    fn chained_and_flattens_into_one_list() {
        let expr = Filter::eq("a", 1)
            .and(Filter::eq("b", 2))
            .and(Filter::eq("c", 3));

        match expr {
            Expr::And(list) => assert_eq!(list.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn delete_query_carries_only_a_filter() {
        let query = DeleteQuery::builder()
            .filter(Filter::eq("name", "Alice"))
            .build();

        assert!(query.filter.is_some());
    }
}
