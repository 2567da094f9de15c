//! Benchmark harness helpers.
//!
//! This module provides utilities for setting up and running benchmarks.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use brook_reactive::ReactiveStore;
use brook_schema::{CommitSet, Entity, EntityType, Schema};
use brook_store::{
    BlockingStore, DeleteSpec, Error, Query, Row, StoreTransaction, UpdateSpec, Value,
};

use crate::fixtures::{blog_schema, generate_posts, generate_users, Scale};

type Table = Vec<Box<dyn Any + Send>>;

/// In-memory delegate for benchmarks.
///
/// Fast and minimal: rows live in per-type vectors, filters and orderings in
/// queries are not evaluated, and nothing is durable. Use the fixtures in
/// `brook-reactive`'s test suite when behavior, not speed, is under test.
pub struct MemStore {
    schema: Arc<Schema>,
    tables: Mutex<HashMap<EntityType, Table>>,
    tx: MemTx,
}

impl MemStore {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(schema),
            tables: Mutex::new(HashMap::new()),
            tx: MemTx::default(),
        }
    }

    fn stage<E: Entity>(&self) {
        if self.tx.active() {
            self.tx.staged.lock().insert(E::entity_type());
        }
    }

    fn rows_of<E: Entity>(&self) -> Vec<E> {
        self.tables
            .lock()
            .get(&E::entity_type())
            .map(|table| {
                table
                    .iter()
                    .filter_map(|row| row.downcast_ref::<E>().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn position_of<E: Entity>(&self, table: &Table, key: &E::Key) -> Option<usize> {
        table
            .iter()
            .position(|row| row.downcast_ref::<E>().is_some_and(|e| e.key() == *key))
    }
}

impl BlockingStore for MemStore {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn insert<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.stage::<E>();
        self.tables
            .lock()
            .entry(E::entity_type())
            .or_default()
            .push(Box::new(entity.clone()));
        Ok(entity)
    }

    fn insert_many<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, Error> {
        entities.into_iter().map(|e| self.insert(e)).collect()
    }

    fn update<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.stage::<E>();
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        let index = self
            .position_of::<E>(table, &entity.key())
            .ok_or(Error::NotFound)?;
        table[index] = Box::new(entity.clone());
        Ok(entity)
    }

    fn update_fields<E: Entity>(&self, entity: E, _fields: &[String]) -> Result<E, Error> {
        self.update(entity)
    }

    fn update_many<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, Error> {
        entities.into_iter().map(|e| self.update(e)).collect()
    }

    fn upsert<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.stage::<E>();
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        match self.position_of::<E>(table, &entity.key()) {
            Some(index) => table[index] = Box::new(entity.clone()),
            None => table.push(Box::new(entity.clone())),
        }
        Ok(entity)
    }

    fn upsert_many<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, Error> {
        entities.into_iter().map(|e| self.upsert(e)).collect()
    }

    fn refresh<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.find_by_key::<E>(entity.key())?.ok_or(Error::NotFound)
    }

    fn refresh_fields<E: Entity>(&self, entity: E, _fields: &[String]) -> Result<E, Error> {
        self.refresh(entity)
    }

    fn refresh_many<E: Entity>(
        &self,
        entities: Vec<E>,
        _fields: &[String],
    ) -> Result<Vec<E>, Error> {
        entities.into_iter().map(|e| self.refresh(e)).collect()
    }

    fn refresh_full<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.refresh(entity)
    }

    fn delete<E: Entity>(&self, entity: E) -> Result<(), Error> {
        self.stage::<E>();
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        let index = self
            .position_of::<E>(table, &entity.key())
            .ok_or(Error::NotFound)?;
        table.remove(index);
        Ok(())
    }

    fn delete_many<E: Entity>(&self, entities: Vec<E>) -> Result<(), Error> {
        entities.into_iter().try_for_each(|e| self.delete(e))
    }

    fn find_by_key<E: Entity>(&self, key: E::Key) -> Result<Option<E>, Error> {
        let tables = self.tables.lock();
        let found = tables.get(&E::entity_type()).and_then(|table| {
            table
                .iter()
                .filter_map(|row| row.downcast_ref::<E>())
                .find(|e| e.key() == key)
                .cloned()
        });
        Ok(found)
    }

    fn fetch<E: Entity>(&self, _query: &Query) -> Result<Vec<E>, Error> {
        Ok(self.rows_of::<E>())
    }

    fn count(&self, query: &Query) -> Result<u64, Error> {
        let tables = self.tables.lock();
        Ok(tables.get(&query.root).map_or(0, |table| table.len()) as u64)
    }

    fn execute_update(&self, spec: &UpdateSpec) -> Result<u64, Error> {
        let tables = self.tables.lock();
        Ok(tables.get(&spec.entity).map_or(0, |table| table.len()) as u64)
    }

    fn execute_delete(&self, spec: &DeleteSpec) -> Result<u64, Error> {
        let mut tables = self.tables.lock();
        Ok(tables
            .remove(&spec.entity)
            .map_or(0, |table| table.len()) as u64)
    }

    fn raw_rows(&self, statement: &str, _params: &[Value]) -> Result<Vec<Row>, Error> {
        Ok(vec![Row::new().with("statement", statement)])
    }

    fn raw_entities<E: Entity>(&self, _statement: &str, _params: &[Value]) -> Result<Vec<E>, Error> {
        Ok(self.rows_of::<E>())
    }

    fn transaction(&self) -> &dyn StoreTransaction {
        &self.tx
    }

    fn close(&self) {}
}

/// Transaction state for [`MemStore`].
#[derive(Default)]
pub struct MemTx {
    active: AtomicBool,
    staged: Mutex<CommitSet>,
}

impl StoreTransaction for MemTx {
    fn active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), Error> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(Error::Transaction("transaction already active".into()));
        }
        Ok(())
    }

    fn commit(&self) -> Result<CommitSet, Error> {
        if !self.active() {
            return Err(Error::Transaction("no active transaction".into()));
        }
        let changes = std::mem::take(&mut *self.staged.lock());
        self.active.store(false, Ordering::SeqCst);
        Ok(changes)
    }

    fn close(&self) {
        self.active.store(false, Ordering::SeqCst);
        *self.staged.lock() = CommitSet::new();
    }
}

/// Test context for benchmarks.
pub struct BenchContext {
    pub store: ReactiveStore<MemStore>,
}

impl BenchContext {
    /// Create a context with the blog schema and no data.
    pub fn new() -> Self {
        Self {
            store: ReactiveStore::new(MemStore::new(blog_schema())),
        }
    }

    /// Create a context populated at the specified scale.
    pub fn with_scale(scale: Scale) -> Self {
        let ctx = Self::new();
        populate_store(&ctx, scale);
        ctx
    }
}

impl Default for BenchContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Populate a context with benchmark data at the specified scale.
///
/// Writes through the blocking delegate directly; population is setup, not
/// the thing being measured.
pub fn populate_store(ctx: &BenchContext, scale: Scale) {
    let users = generate_users(scale.rows());
    let user_ids: Vec<_> = users.iter().map(|u| u.id).collect();
    let posts = generate_posts(scale.rows(), &user_ids);

    let delegate = ctx.store.as_blocking();
    delegate.insert_many(users).unwrap();
    delegate.insert_many(posts).unwrap();
}

/// Single-threaded runtime for driving deferred operations in benchmarks.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}
