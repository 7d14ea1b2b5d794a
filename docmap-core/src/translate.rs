//! Translation of typed queries into the driver-executable native form.
//!
//! A [`Query`] is written in entity-field terms with, possibly, unbound
//! placeholders. Translation rewrites it deterministically against an
//! [`EntityDescriptor`]: field names become document field names, every
//! operator is checked against the driver's [`Capabilities`], and
//! placeholders are resolved from the supplied bindings. Filter order is
//! preserved. The result is a [`NativeQuery`] the driver can execute
//! without any knowledge of entity types.

use bson::Bson;
use std::collections::HashMap;

use crate::{
    driver::{Capabilities, Capability},
    entity::EntityDescriptor,
    error::{TemplateError, TemplateResult},
    query::{DeleteQuery, Expr, FieldOp, Operand, Query, QueryVisitor, Sort},
};

/// A translated query in the form drivers execute.
///
/// Field names are document-side, placeholders are resolved, and operators
/// are known to be within the driver's capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    /// The collection to query.
    pub collection: String,
    /// Resolved filter expression, if any.
    pub filter: Option<Expr>,
    /// Sort keys in application order, document-side field names.
    pub sort: Vec<Sort>,
    /// Number of rows to skip.
    pub skip: Option<u64>,
    /// Maximum number of rows to return.
    pub limit: Option<u64>,
}

/// A translated bulk-delete query: collection and resolved filter only.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeDeleteQuery {
    /// The collection to delete from.
    pub collection: String,
    /// Resolved filter expression; absent means every document matches.
    pub filter: Option<Expr>,
}

/// Translates caller queries into [`NativeQuery`] form.
///
/// A translator borrows the descriptor and capability set for one
/// translation pass; it holds no other state, so translation is
/// deterministic.
pub struct QueryTranslator<'a> {
    descriptor: &'a EntityDescriptor,
    capabilities: &'a Capabilities,
    bindings: Option<&'a HashMap<String, Bson>>,
}

impl<'a> QueryTranslator<'a> {
    /// Creates a translator with no parameter bindings.
    pub fn new(descriptor: &'a EntityDescriptor, capabilities: &'a Capabilities) -> Self {
        Self { descriptor, capabilities, bindings: None }
    }

    /// Creates a translator resolving placeholders from the given bindings.
    pub fn with_bindings(
        descriptor: &'a EntityDescriptor,
        capabilities: &'a Capabilities,
        bindings: &'a HashMap<String, Bson>,
    ) -> Self {
        Self {
            descriptor,
            capabilities,
            bindings: Some(bindings),
        }
    }

    /// Translates a selection query.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Unsupported`] when the filter uses an
    /// operator outside the driver's capabilities, and
    /// [`TemplateError::InvalidArgument`] for unbound placeholders.
    pub fn translate(&self, query: &Query) -> TemplateResult<NativeQuery> {
        let filter = query
            .filter
            .as_ref()
            .map(|expr| self.rewrite(expr))
            .transpose()?;

        Ok(NativeQuery {
            collection: self.descriptor.collection().to_string(),
            filter,
            sort: query
                .sort
                .iter()
                .map(|sort| Sort {
                    field: self
                        .descriptor
                        .document_field(&sort.field)
                        .to_string(),
                    direction: sort.direction.clone(),
                })
                .collect(),
            skip: query.offset,
            limit: query.limit,
        })
    }

    /// Translates a bulk-delete query under the same rules.
    pub fn translate_delete(&self, query: &DeleteQuery) -> TemplateResult<NativeDeleteQuery> {
        let filter = query
            .filter
            .as_ref()
            .map(|expr| self.rewrite(expr))
            .transpose()?;

        Ok(NativeDeleteQuery {
            collection: self.descriptor.collection().to_string(),
            filter,
        })
    }

    fn rewrite(&self, expr: &Expr) -> TemplateResult<Expr> {
        let mut rewriter = FilterRewriter { translator: self };

        rewriter.visit_expr(expr)
    }

    fn require(&self, capability: Capability, operator: &str) -> TemplateResult<()> {
        if self.capabilities.supports(capability) {
            Ok(())
        } else {
            Err(TemplateError::Unsupported(format!(
                "driver does not support the '{operator}' operator ({capability:?} capability missing)",
            )))
        }
    }

    fn resolve(&self, operand: &Operand) -> TemplateResult<Operand> {
        match operand {
            Operand::Value(value) => Ok(Operand::Value(value.clone())),
            Operand::Param(name) => self
                .bindings
                .and_then(|bindings| bindings.get(name))
                .map(|value| Operand::Value(value.clone()))
                .ok_or_else(|| {
                    TemplateError::InvalidArgument(format!(
                        "query parameter '{name}' is not bound",
                    ))
                }),
        }
    }
}

/// Rewrites a filter tree node by node, preserving sub-expression order.
struct FilterRewriter<'a, 'b> {
    translator: &'b QueryTranslator<'a>,
}

impl QueryVisitor for FilterRewriter<'_, '_> {
    type Output = Expr;
    type Error = TemplateError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(Expr::And(
            exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(Expr::Or(
            exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        self.translator
            .require(Capability::Negation, "not")?;

        Ok(Expr::Not(Box::new(self.visit_expr(expr)?)))
    }

    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error> {
        self.translator
            .require(Capability::Existence, "exists")?;

        Ok(Expr::Exists(
            self.translator
                .descriptor
                .document_field(field)
                .to_string(),
            should_exist,
        ))
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        operand: &Operand,
    ) -> Result<Self::Output, Self::Error> {
        match op {
            FieldOp::Eq | FieldOp::Ne => {}
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                self.translator
                    .require(Capability::Compare, op.name())?;
            }
            FieldOp::Contains | FieldOp::StartsWith | FieldOp::EndsWith => {
                self.translator
                    .require(Capability::TextMatch, op.name())?;
            }
            FieldOp::In | FieldOp::NotIn => {
                self.translator
                    .require(Capability::Membership, op.name())?;
            }
        }

        Ok(Expr::Field {
            field: self
                .translator
                .descriptor
                .document_field(field)
                .to_string(),
            op: op.clone(),
            operand: self.translator.resolve(operand)?,
        })
    }
}
