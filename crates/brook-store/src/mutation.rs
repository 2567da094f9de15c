//! Bulk mutation IR types.

use brook_schema::EntityType;

use crate::query::FilterExpr;
use crate::value::Value;

/// A set-based update over one entity type.
///
/// Applied by the store in a single statement; individual entities are never
/// materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpec {
    /// Entity type to update.
    pub entity: EntityType,
    /// Field assignments to apply.
    pub sets: Vec<(String, Value)>,
    /// Optional filter selecting the rows to update.
    pub filter: Option<FilterExpr>,
}

impl UpdateSpec {
    /// Create an update spec for an entity type.
    pub fn new(entity: impl Into<EntityType>) -> Self {
        Self {
            entity: entity.into(),
            sets: vec![],
            filter: None,
        }
    }

    /// Add a field assignment.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.push((field.into(), value.into()));
        self
    }

    /// Set a filter selecting the rows to update.
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// A set-based delete over one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteSpec {
    /// Entity type to delete from.
    pub entity: EntityType,
    /// Optional filter selecting the rows to delete.
    pub filter: Option<FilterExpr>,
}

impl DeleteSpec {
    /// Create a delete spec for an entity type.
    pub fn new(entity: impl Into<EntityType>) -> Self {
        Self {
            entity: entity.into(),
            filter: None,
        }
    }

    /// Set a filter selecting the rows to delete.
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }
}
