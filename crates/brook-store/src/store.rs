//! The blocking store contract.

use std::sync::Arc;

use brook_schema::{CommitSet, Entity, Schema};

use crate::error::Error;
use crate::mutation::{DeleteSpec, UpdateSpec};
use crate::query::Query;
use crate::value::Value;

/// A synchronous entity store.
///
/// This is the seam between the reactive layer and whatever actually persists
/// data. Implementations block the calling thread; the reactive layer
/// serializes every call onto a dedicated worker thread, so implementations
/// never see concurrent mutating calls but must still be shareable across
/// threads.
///
/// Entity methods return the affected entities with any store-generated state
/// (keys, versions, defaults) applied.
pub trait BlockingStore: Send + Sync + 'static {
    /// The schema this store was opened with.
    fn schema(&self) -> Arc<Schema>;

    /// Insert a new entity.
    fn insert<E: Entity>(&self, entity: E) -> Result<E, Error>;

    /// Insert a batch of entities.
    fn insert_many<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, Error>;

    /// Update an existing entity, writing all of its fields.
    ///
    /// Fails with [`Error::NotFound`] when no row matches the entity's key.
    fn update<E: Entity>(&self, entity: E) -> Result<E, Error>;

    /// Update only the named fields of an existing entity.
    fn update_fields<E: Entity>(&self, entity: E, fields: &[String]) -> Result<E, Error>;

    /// Update a batch of entities.
    fn update_many<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, Error>;

    /// Insert the entity, or update it if its key already exists.
    fn upsert<E: Entity>(&self, entity: E) -> Result<E, Error>;

    /// Upsert a batch of entities.
    fn upsert_many<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, Error>;

    /// Reload an entity's default field set from the store.
    ///
    /// Fails with [`Error::NotFound`] when the row no longer exists.
    fn refresh<E: Entity>(&self, entity: E) -> Result<E, Error>;

    /// Reload only the named fields of an entity.
    fn refresh_fields<E: Entity>(&self, entity: E, fields: &[String]) -> Result<E, Error>;

    /// Reload a batch of entities. An empty field list means the default
    /// field set.
    fn refresh_many<E: Entity>(&self, entities: Vec<E>, fields: &[String]) -> Result<Vec<E>, Error>;

    /// Reload every field of an entity.
    fn refresh_full<E: Entity>(&self, entity: E) -> Result<E, Error>;

    /// Delete an entity by its key.
    ///
    /// Fails with [`Error::NotFound`] when no row matches.
    fn delete<E: Entity>(&self, entity: E) -> Result<(), Error>;

    /// Delete a batch of entities.
    fn delete_many<E: Entity>(&self, entities: Vec<E>) -> Result<(), Error>;

    /// Look up a single entity by key. Missing rows are `None`, not an error.
    fn find_by_key<E: Entity>(&self, key: E::Key) -> Result<Option<E>, Error>;

    /// Run a query and materialize the matching entities.
    fn fetch<E: Entity>(&self, query: &Query) -> Result<Vec<E>, Error>;

    /// Count the rows a query would return.
    fn count(&self, query: &Query) -> Result<u64, Error>;

    /// Apply a set-based update, returning the affected row count.
    fn execute_update(&self, spec: &UpdateSpec) -> Result<u64, Error>;

    /// Apply a set-based delete, returning the affected row count.
    fn execute_delete(&self, spec: &DeleteSpec) -> Result<u64, Error>;

    /// Run a raw statement, returning untyped rows.
    fn raw_rows(&self, statement: &str, params: &[Value]) -> Result<Vec<Row>, Error>;

    /// Run a raw statement, materializing rows as entities.
    fn raw_entities<E: Entity>(&self, statement: &str, params: &[Value]) -> Result<Vec<E>, Error>;

    /// The store's transaction controller.
    fn transaction(&self) -> &dyn StoreTransaction;

    /// Close the store. Idempotent; later calls on any method fail with
    /// [`Error::Closed`].
    fn close(&self);
}

/// Transaction control for a [`BlockingStore`].
///
/// Mutating calls made while a transaction is active are staged and only
/// become durable on [`commit`](StoreTransaction::commit). Outside a
/// transaction each mutating call commits on its own.
pub trait StoreTransaction: Send + Sync {
    /// Whether a transaction is currently active.
    fn active(&self) -> bool;

    /// Begin a transaction. Fails when one is already active.
    fn begin(&self) -> Result<(), Error>;

    /// Commit the active transaction.
    ///
    /// Returns the set of entity types written during the transaction. On
    /// failure the transaction is left for [`close`](StoreTransaction::close)
    /// to dispose of.
    fn commit(&self) -> Result<CommitSet, Error>;

    /// End the transaction, rolling back anything uncommitted. Idempotent.
    fn close(&self);
}

/// A single row from a raw query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column to the row.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Iterate over column names in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(field, _)| field.as_str())
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
