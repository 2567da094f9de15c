//! Relation definitions between entities.

use crate::types::EntityType;

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// One-to-one relation (unique foreign key).
    OneToOne,
    /// One-to-many relation (foreign key on the referencing side).
    OneToMany,
    /// Many-to-many relation (requires an edge entity).
    ManyToMany,
}

/// A relation definition between two entities.
///
/// `from_entity` is the side holding the foreign key; it references
/// `to_entity`. For many-to-many relations the foreign keys live on the edge
/// entity, which references both endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDef {
    /// Relation name (unique within a schema).
    pub name: String,
    /// Entity holding the foreign key.
    pub from_entity: EntityType,
    /// Referenced entity.
    pub to_entity: EntityType,
    /// Relation cardinality.
    pub cardinality: Cardinality,
    /// Foreign key field on the referencing entity.
    pub from_field: String,
    /// Referenced field (usually the identity).
    pub to_field: String,
    /// Edge entity for many-to-many relations.
    pub edge_entity: Option<EntityType>,
}

impl RelationDef {
    /// Create a one-to-one relation.
    pub fn one_to_one(
        name: impl Into<String>,
        from_entity: impl Into<EntityType>,
        from_field: impl Into<String>,
        to_entity: impl Into<EntityType>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality: Cardinality::OneToOne,
            from_field: from_field.into(),
            to_field: to_field.into(),
            edge_entity: None,
        }
    }

    /// Create a one-to-many relation.
    pub fn one_to_many(
        name: impl Into<String>,
        from_entity: impl Into<EntityType>,
        from_field: impl Into<String>,
        to_entity: impl Into<EntityType>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality: Cardinality::OneToMany,
            from_field: from_field.into(),
            to_field: to_field.into(),
            edge_entity: None,
        }
    }

    /// Create a many-to-many relation.
    pub fn many_to_many(
        name: impl Into<String>,
        from_entity: impl Into<EntityType>,
        from_field: impl Into<String>,
        to_entity: impl Into<EntityType>,
        to_field: impl Into<String>,
        edge_entity: impl Into<EntityType>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality: Cardinality::ManyToMany,
            from_field: from_field.into(),
            to_field: to_field.into(),
            edge_entity: Some(edge_entity.into()),
        }
    }

    /// Check if this is a many-to-many relation.
    pub fn is_many_to_many(&self) -> bool {
        self.cardinality == Cardinality::ManyToMany
    }
}
