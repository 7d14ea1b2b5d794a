//! Filter evaluation for in-memory document matching.
//!
//! This module provides the evaluation engine for resolved filter
//! expressions, matching them against BSON documents one at a time.

use bson::{Bson, Document, datetime::DateTime};
use std::{cmp::Ordering, collections::HashMap};

use docmap_core::{
    error::{TemplateError, TemplateResult},
    query::{Expr, FieldOp, Operand, QueryVisitor},
};

/// Type-erased, comparable representation of BSON values.
///
/// Wraps BSON values for filter comparison, normalizing all numeric types
/// to f64.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr.iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Evaluates a resolved filter expression against one document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> TemplateResult<bool> {
        self.visit_expr(expr)
    }

    fn literal<'b>(&self, operand: &'b Operand) -> TemplateResult<&'b Bson> {
        match operand {
            Operand::Value(value) => Ok(value),
            Operand::Param(name) => Err(TemplateError::InvalidArgument(format!(
                "query parameter '{name}' reached the driver unresolved",
            ))),
        }
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = TemplateError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error> {
        Ok(self.document.get(field).is_some() == should_exist)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        operand: &Operand,
    ) -> Result<Self::Output, Self::Error> {
        let value = self.literal(operand)?;

        match self.document.get(field) {
            Some(field_value) => match op {
                FieldOp::Eq => Ok(Comparable::from(field_value) == Comparable::from(value)),
                FieldOp::Ne => Ok(Comparable::from(field_value) != Comparable::from(value)),
                FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                    match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                        Some(ordering) => Ok(match op {
                            FieldOp::Gt => ordering == Ordering::Greater,
                            FieldOp::Gte => {
                                ordering == Ordering::Greater || ordering == Ordering::Equal
                            }
                            FieldOp::Lt => ordering == Ordering::Less,
                            FieldOp::Lte => {
                                ordering == Ordering::Less || ordering == Ordering::Equal
                            }
                            _ => unreachable!(),
                        }),
                        None => Ok(false),
                    }
                }
                FieldOp::Contains => match Comparable::from(field_value) {
                    Comparable::Array(array) => Ok(array
                        .iter()
                        .any(|item| item == &Comparable::from(value))),
                    Comparable::String(left) => match Comparable::from(value) {
                        Comparable::String(right) => Ok(left.contains(right)),
                        _ => Ok(false),
                    },
                    _ => Ok(false),
                },
                FieldOp::StartsWith => {
                    match (Comparable::from(field_value), Comparable::from(value)) {
                        (Comparable::String(left), Comparable::String(right)) => {
                            Ok(left.starts_with(right))
                        }
                        _ => Ok(false),
                    }
                }
                FieldOp::EndsWith => {
                    match (Comparable::from(field_value), Comparable::from(value)) {
                        (Comparable::String(left), Comparable::String(right)) => {
                            Ok(left.ends_with(right))
                        }
                        _ => Ok(false),
                    }
                }
                FieldOp::In => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::Array(array), Comparable::Array(values)) => {
                        for val in values {
                            if array.iter().any(|item| item == &val) {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    }
                    (single_value, Comparable::Array(values)) => {
                        for val in values {
                            if val == single_value {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    }
                    (field_value, single_value) => Ok(field_value == single_value),
                },
                FieldOp::NotIn => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::Array(array), Comparable::Array(values)) => {
                        for val in values {
                            if array.iter().any(|item| item == &val) {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    (single_value, Comparable::Array(values)) => {
                        for val in values {
                            if val == single_value {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    (field_value, single_value) => Ok(field_value != single_value),
                },
            },
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docmap_core::query::Filter;

    fn matches(document: &Document, expr: &Expr) -> bool {
        DocumentEvaluator::new(document)
            .evaluate(expr)
            .unwrap()
    }

    #[test]
    fn equality_and_comparison() {
        let document = doc! { "name": "Alice", "age": 30 };

        assert!(matches(&document, &Filter::eq("name", "Alice")));
        assert!(!matches(&document, &Filter::eq("name", "Bob")));
        assert!(matches(&document, &Filter::gt("age", 18)));
        assert!(!matches(&document, &Filter::lt("age", 18)));
        assert!(matches(&document, &Filter::gte("age", 30)));
    }

    #[test]
    fn text_operators() {
        let document = doc! { "name": "Alice" };

        assert!(matches(&document, &Filter::starts_with("name", "Al")));
        assert!(matches(&document, &Filter::ends_with("name", "ce")));
        assert!(matches(&document, &Filter::contains("name", "lic")));
        assert!(!matches(&document, &Filter::contains("name", "bob")));
    }

    #[test]
    fn membership_against_scalar_field() {
        let document = doc! { "role": "admin" };

        assert!(matches(
            &document,
            &Filter::is_in("role", vec!["admin", "owner"])
        ));
        assert!(matches(
            &document,
            &Filter::not_in("role", vec!["guest"])
        ));
    }

    #[test]
    fn logic_and_existence() {
        let document = doc! { "name": "Alice", "age": 30 };

        assert!(matches(
            &document,
            &Filter::eq("name", "Alice").and(Filter::gt("age", 18))
        ));
        assert!(matches(
            &document,
            &Filter::eq("name", "Bob").or(Filter::eq("age", 30))
        ));
        assert!(matches(&document, &Filter::eq("name", "Bob").not()));
        assert!(matches(&document, &Filter::exists("age")));
        assert!(matches(&document, &Filter::not_exists("email")));
    }

    #[test]
    fn missing_field_never_matches_a_comparison() {
        let document = doc! { "name": "Alice" };

        assert!(!matches(&document, &Filter::eq("email", "a@b.c")));
        assert!(!matches(&document, &Filter::gt("age", 1)));
    }

    #[test]
    fn unresolved_parameter_is_an_error() {
        let document = doc! { "name": "Alice" };
        let expr = Filter::param("name", FieldOp::Eq, "who");

        let result = DocumentEvaluator::new(&document).evaluate(&expr);
        assert!(matches!(result, Err(TemplateError::InvalidArgument(_))));
    }
}
