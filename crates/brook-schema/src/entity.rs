//! Entity definitions and the entity binding trait.

use crate::types::{EntityType, ScalarType};

/// An entity definition (one persisted type).
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    /// Entity type (unique within a schema).
    pub name: EntityType,
    /// Name of the primary identity field.
    pub identity_field: String,
    /// Field definitions.
    pub fields: Vec<FieldDef>,
}

/// A field definition within an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Scalar type of the field.
    pub scalar: ScalarType,
    /// Whether the field is required (non-nullable at the application level).
    pub required: bool,
}

impl EntityDef {
    /// Create a new entity definition.
    pub fn new(name: impl Into<EntityType>, identity_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the entity.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get the identity field definition.
    pub fn get_identity_field(&self) -> Option<&FieldDef> {
        self.get_field(&self.identity_field)
    }
}

impl FieldDef {
    /// Create a new required field.
    pub fn new(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            required: true,
        }
    }

    /// Create an optional field (required = false).
    pub fn optional(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            required: false,
        }
    }
}

/// Binds a Rust struct to its registered entity type and key.
///
/// Implementors are plain data carriers. The `Clone` bound is what lets a
/// deferred store operation re-run: each start clones the captured entity
/// and hands a fresh copy to the delegate.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Primary key type.
    type Key: Clone + Eq + Send + Sync + 'static;

    /// The registered entity type this struct maps to.
    fn entity_type() -> EntityType;

    /// The primary key of this instance.
    fn key(&self) -> Self::Key;
}
