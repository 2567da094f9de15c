//! Schema assembly and relationship indexes.

use std::collections::{HashMap, HashSet};

use crate::entity::EntityDef;
use crate::relation::RelationDef;
use crate::types::EntityType;

/// A registered data model: entity definitions, relations, and the lookup
/// indexes the notification layer depends on.
///
/// Built once with the `with_*` methods and immutable afterwards. Two
/// questions are answered from precomputed state:
///
/// - [`referencing`](Schema::referencing): which types hold a relationship
///   reference to a given type (reverse lookup over the relation set),
/// - [`reachable_types`](Schema::reachable_types): which types a query can
///   touch given its root and included relations.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: HashMap<EntityType, EntityDef>,
    relations: HashMap<String, RelationDef>,
    referencing: HashMap<EntityType, HashSet<EntityType>>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity definition.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Add a relation definition and index it.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.index_relation(&relation);
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    // The referencing index answers "who points at T". The from side holds
    // the foreign key; an edge entity holds keys to both endpoints.
    fn index_relation(&mut self, relation: &RelationDef) {
        self.referencing
            .entry(relation.to_entity.clone())
            .or_default()
            .insert(relation.from_entity.clone());

        if let Some(edge) = &relation.edge_entity {
            self.referencing
                .entry(relation.from_entity.clone())
                .or_default()
                .insert(edge.clone());
            self.referencing
                .entry(relation.to_entity.clone())
                .or_default()
                .insert(edge.clone());
        }
    }

    /// Get an entity definition by name.
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Get a relation definition by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    /// Iterate over all entity definitions.
    pub fn entities(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.values()
    }

    /// Iterate over all relation definitions.
    pub fn relations(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations.values()
    }

    /// Types holding a relationship reference to `entity_type`.
    ///
    /// Empty when nothing references the type.
    pub fn referencing(&self, entity_type: &EntityType) -> impl Iterator<Item = &EntityType> {
        self.referencing.get(entity_type).into_iter().flatten()
    }

    /// The set of entity types a query can reach: its root plus both
    /// endpoints (and edge, if any) of every included relation.
    ///
    /// Unknown relation names are skipped; the delegate rejects them when the
    /// query actually runs.
    pub fn reachable_types(&self, root: &EntityType, includes: &[String]) -> HashSet<EntityType> {
        let mut types = HashSet::new();
        types.insert(root.clone());

        for name in includes {
            if let Some(relation) = self.relations.get(name) {
                types.insert(relation.from_entity.clone());
                types.insert(relation.to_entity.clone());
                if let Some(edge) = &relation.edge_entity {
                    types.insert(edge.clone());
                }
            }
        }

        types
    }
}
