//! Entity trait and per-type mapping metadata.
//!
//! This module provides the [`Entity`] trait that all mapped types must
//! implement, the immutable [`EntityDescriptor`] derived from it, and the
//! process-wide [`DescriptorRegistry`] that builds each descriptor exactly
//! once.

use bson::Uuid;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{any::TypeId, collections::HashMap, sync::Arc};

/// Core trait that all mapped entity types must implement.
///
/// An entity is any serde type with a unique identifier and a collection
/// name. Field names may optionally be remapped between the entity and its
/// document form via [`Entity::field_mappings`].
///
/// # Example
///
/// ```ignore
/// use docmap::entity::Entity;
/// use bson::Uuid;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Person {
///     pub id: Uuid,
///     pub name: String,
/// }
///
/// impl Entity for Person {
///     fn id(&self) -> &Uuid {
///         &self.id
///     }
///
///     fn collection_name() -> &'static str {
///         "people"
///     }
/// }
/// ```
pub trait Entity: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns a reference to this entity's unique identifier.
    fn id(&self) -> &Uuid;

    /// Returns the name of the collection this entity is persisted in.
    ///
    /// This should be a static, lowercase identifier (e.g., "people",
    /// "orders").
    fn collection_name() -> &'static str;

    /// Returns the entity-side name of the identifier field.
    fn id_field() -> &'static str {
        "id"
    }

    /// Returns (entity field, document field) rename pairs.
    ///
    /// Fields not listed here keep their entity name in the document.
    fn field_mappings() -> &'static [(&'static str, &'static str)] {
        &[]
    }
}

/// Immutable per-type mapping metadata.
///
/// A descriptor is built once per entity type and shared read-only by every
/// operation on that type: collection name, identifier field on both sides
/// of the mapping, and the field rename table in both directions.
#[derive(Debug)]
pub struct EntityDescriptor {
    collection: String,
    id_field: String,
    id_document_field: String,
    to_document: HashMap<String, String>,
    to_entity: HashMap<String, String>,
}

impl EntityDescriptor {
    /// Builds the descriptor for an entity type from its trait metadata.
    pub fn of<T: Entity>() -> Self {
        let to_document: HashMap<String, String> = T::field_mappings()
            .iter()
            .map(|(entity, document)| (entity.to_string(), document.to_string()))
            .collect();
        let to_entity: HashMap<String, String> = T::field_mappings()
            .iter()
            .map(|(entity, document)| (document.to_string(), entity.to_string()))
            .collect();
        let id_field = T::id_field().to_string();
        let id_document_field = to_document
            .get(&id_field)
            .cloned()
            .unwrap_or_else(|| id_field.clone());

        Self {
            collection: T::collection_name().to_string(),
            id_field,
            id_document_field,
            to_document,
            to_entity,
        }
    }

    /// Returns the collection name for this entity type.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the entity-side name of the identifier field.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Returns the document-side name of the identifier field.
    pub fn id_document_field(&self) -> &str {
        &self.id_document_field
    }

    /// Maps an entity field name to its document field name.
    ///
    /// Fields without an explicit mapping keep their name.
    pub fn document_field<'a>(&'a self, entity_field: &'a str) -> &'a str {
        self.to_document
            .get(entity_field)
            .map(String::as_str)
            .unwrap_or(entity_field)
    }

    /// Maps a document field name back to its entity field name.
    pub fn entity_field<'a>(&'a self, document_field: &'a str) -> &'a str {
        self.to_entity
            .get(document_field)
            .map(String::as_str)
            .unwrap_or(document_field)
    }
}

/// Process-wide registry of entity descriptors.
///
/// Descriptors are constructed lazily on first use and shared thereafter.
/// Construct-or-fetch is atomic per type key, so concurrent first access
/// from any number of tasks converges on a single descriptor instance.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    descriptors: DashMap<TypeId, Arc<EntityDescriptor>>,
}

impl DescriptorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { descriptors: DashMap::new() }
    }

    /// Returns the descriptor for `T`, building it on first access.
    pub fn descriptor<T: Entity>(&self) -> Arc<EntityDescriptor> {
        self.descriptors
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(EntityDescriptor::of::<T>()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Person {
        id: Uuid,
        name: String,
    }

    impl Entity for Person {
        fn id(&self) -> &Uuid {
            &self.id
        }

        fn collection_name() -> &'static str {
            "people"
        }

        fn field_mappings() -> &'static [(&'static str, &'static str)] {
            &[("id", "_key"), ("name", "full_name")]
        }
    }

    #[test]
    fn descriptor_maps_fields_both_ways() {
        let descriptor = EntityDescriptor::of::<Person>();

        assert_eq!(descriptor.collection(), "people");
        assert_eq!(descriptor.id_document_field(), "_key");
        assert_eq!(descriptor.document_field("name"), "full_name");
        assert_eq!(descriptor.entity_field("full_name"), "name");
        assert_eq!(descriptor.document_field("unmapped"), "unmapped");
    }

    #[test]
    fn concurrent_first_access_yields_one_descriptor() {
        let registry = Arc::new(DescriptorRegistry::new());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.descriptor::<Person>()
                })
            })
            .collect();

        let descriptors: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let first = &descriptors[0];
        for descriptor in &descriptors {
            assert!(Arc::ptr_eq(first, descriptor));
        }
    }
}
