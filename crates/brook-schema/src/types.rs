//! Entity type identifiers and scalar field types.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Opaque identifier for a class of persisted entities.
///
/// Entity types are interned strings: cloning is a reference-count bump, so
/// they can live in the hot sets the notification bus compares on every
/// publish. Defined once at schema-registration time and immutable after.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityType(Arc<str>);

impl EntityType {
    /// Create an entity type from a name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The entity type name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self(Arc::from(name.as_str()))
    }
}

impl AsRef<str> for EntityType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Hash(EntityType) delegates to the inner str, so str-keyed lookups into
// maps and sets keyed by EntityType are sound.
impl Borrow<str> for EntityType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Scalar type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Boolean.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Microseconds since the Unix epoch.
    Timestamp,
    /// UUID as 16 bytes.
    Uuid,
}
