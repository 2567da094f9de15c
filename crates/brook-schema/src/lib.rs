//! Entity metadata model for brook.
//!
//! This crate defines the registration-time data model the reactive layer
//! depends on: entity type identifiers, entity and relation definitions, the
//! [`Schema`] that indexes them, and the [`CommitSet`] values that describe
//! which entity types a committed transaction touched.
//!
//! The schema is immutable once built. Everything the notification layer
//! needs at runtime ("which types does this query reach?", "which types hold
//! references to this type?") is answered from indexes computed while the
//! schema is assembled.

pub mod changes;
pub mod entity;
pub mod relation;
pub mod schema;
pub mod types;

// Core model types
pub use changes::CommitSet;
pub use entity::{Entity, EntityDef, FieldDef};
pub use relation::{Cardinality, RelationDef};
pub use schema::Schema;
pub use types::{EntityType, ScalarType};
