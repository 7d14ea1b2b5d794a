//! Conversion between typed entities and their document representation.
//!
//! The codec is a pure transformation: given the immutable
//! [`EntityDescriptor`](crate::entity::EntityDescriptor) for a type, it maps
//! every persistable field of an entity into an ordered set of named fields
//! and back, without touching the store.

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};

use crate::{
    entity::{Entity, EntityDescriptor},
    error::{TemplateError, TemplateResult},
};

const DEFAULT_MAX_DEPTH: usize = 128;

/// Maps entities to documents and back using per-type descriptors.
///
/// Encoding serializes the entity through BSON and applies the descriptor's
/// field renames to the top-level fields; decoding reverses both steps.
/// Nesting is bounded so that a runaway recursive object graph is rejected
/// with a [`TemplateError::Mapping`] instead of recursing without end.
#[derive(Debug, Clone, Copy)]
pub struct DocumentCodec {
    max_depth: usize,
}

impl Default for DocumentCodec {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl DocumentCodec {
    /// Creates a codec with the default nesting bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec with a custom nesting bound.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Converts an entity into its document form.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Mapping`] if a field type cannot be
    /// represented, if the entity does not serialize to a document, or if
    /// the value graph exceeds the nesting bound.
    pub fn to_document<T: Entity>(
        &self,
        entity: &T,
        descriptor: &EntityDescriptor,
    ) -> TemplateResult<Document> {
        let value = serialize_to_bson(entity)
            .map_err(|e| TemplateError::Mapping(e.to_string()))?;
        let document = match value {
            Bson::Document(document) => document,
            _ => {
                return Err(TemplateError::Mapping(format!(
                    "entity for collection {} did not serialize to a document",
                    descriptor.collection(),
                )));
            }
        };

        self.ensure_depth(&document, self.max_depth, descriptor)?;

        Ok(document
            .into_iter()
            .map(|(field, value)| (descriptor.document_field(&field).to_string(), value))
            .collect())
    }

    /// Converts a document back into a typed entity.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Mapping`] if the identifier field is absent
    /// from the document or deserialization fails.
    pub fn from_document<T: Entity>(
        &self,
        document: Document,
        descriptor: &EntityDescriptor,
    ) -> TemplateResult<T> {
        if !document.contains_key(descriptor.id_document_field()) {
            return Err(TemplateError::Mapping(format!(
                "document in collection {} is missing the identifier field {}",
                descriptor.collection(),
                descriptor.id_document_field(),
            )));
        }

        let renamed: Document = document
            .into_iter()
            .map(|(field, value)| (descriptor.entity_field(&field).to_string(), value))
            .collect();

        deserialize_from_bson(Bson::Document(renamed))
            .map_err(|e| TemplateError::Mapping(e.to_string()))
    }

    fn ensure_depth(
        &self,
        document: &Document,
        remaining: usize,
        descriptor: &EntityDescriptor,
    ) -> TemplateResult<()> {
        if remaining == 0 {
            return Err(TemplateError::Mapping(format!(
                "entity for collection {} exceeds nesting depth {} (cyclic object graph?)",
                descriptor.collection(),
                self.max_depth,
            )));
        }

        for (_, value) in document.iter() {
            self.ensure_value_depth(value, remaining - 1, descriptor)?;
        }

        Ok(())
    }

    fn ensure_value_depth(
        &self,
        value: &Bson,
        remaining: usize,
        descriptor: &EntityDescriptor,
    ) -> TemplateResult<()> {
        match value {
            Bson::Document(document) => self.ensure_depth(document, remaining, descriptor),
            Bson::Array(items) => {
                if remaining == 0 {
                    return Err(TemplateError::Mapping(format!(
                        "entity for collection {} exceeds nesting depth {} (cyclic object graph?)",
                        descriptor.collection(),
                        self.max_depth,
                    )));
                }
                for item in items {
                    self.ensure_value_depth(item, remaining - 1, descriptor)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
