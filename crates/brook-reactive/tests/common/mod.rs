//! Shared test fixture: an in-memory blocking store with observable calls
//! and a scripted transaction controller.

#![allow(dead_code)]

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use brook_reactive::bus::BusSubscription;
use brook_schema::{
    CommitSet, Entity, EntityDef, EntityType, FieldDef, RelationDef, ScalarType, Schema,
};
use brook_store::{
    BlockingStore, DeleteSpec, Error, Query, Row, StoreTransaction, UpdateSpec, Value,
};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
}

impl User {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Entity for User {
    type Key = i64;

    fn entity_type() -> EntityType {
        EntityType::from("User")
    }

    fn key(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
}

impl Post {
    pub fn new(id: i64, author_id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            author_id,
            title: title.into(),
        }
    }
}

impl Entity for Post {
    type Key = i64;

    fn entity_type() -> EntityType {
        EntityType::from("Post")
    }

    fn key(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
}

impl Comment {
    pub fn new(id: i64, post_id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            post_id,
            text: text.into(),
        }
    }
}

impl Entity for Comment {
    type Key = i64;

    fn entity_type() -> EntityType {
        EntityType::from("Comment")
    }

    fn key(&self) -> i64 {
        self.id
    }
}

/// Post references User through `posts`, Comment references Post through
/// `comments`. Tag sits apart so tests have a type nothing references.
pub fn blog_schema() -> Schema {
    let user = EntityDef::new("User", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("name", ScalarType::String));
    let post = EntityDef::new("Post", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("author_id", ScalarType::Int64))
        .with_field(FieldDef::new("title", ScalarType::String));
    let comment = EntityDef::new("Comment", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("post_id", ScalarType::Int64))
        .with_field(FieldDef::new("text", ScalarType::String));
    let tag = EntityDef::new("Tag", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("label", ScalarType::String));

    Schema::new()
        .with_entity(user)
        .with_entity(post)
        .with_entity(comment)
        .with_entity(tag)
        .with_relation(RelationDef::one_to_many(
            "posts", "Post", "author_id", "User", "id",
        ))
        .with_relation(RelationDef::one_to_many(
            "comments", "Comment", "post_id", "Post", "id",
        ))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

impl Tag {
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

impl Entity for Tag {
    type Key = i64;

    fn entity_type() -> EntityType {
        EntityType::from("Tag")
    }

    fn key(&self) -> i64 {
        self.id
    }
}

type Table = Vec<Box<dyn Any + Send>>;

/// In-memory [`BlockingStore`] that records every call it receives.
///
/// Rows are applied in place and filters are not evaluated; the adapter
/// tests assert call ordering and notifications, not query semantics.
/// Rolling back a transaction resets bookkeeping only.
pub struct MemoryStore {
    schema: Arc<Schema>,
    tables: Mutex<HashMap<EntityType, Table>>,
    calls: Arc<Mutex<Vec<String>>>,
    closed: AtomicBool,
    tx: TxControl,
}

pub struct TxControl {
    active: AtomicBool,
    staged: Mutex<HashSet<EntityType>>,
    fail_next_commit: AtomicBool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MemoryStore {
    pub fn new(schema: Schema) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        Self {
            schema: Arc::new(schema),
            tables: Mutex::new(HashMap::new()),
            calls: calls.clone(),
            closed: AtomicBool::new(false),
            tx: TxControl {
                active: AtomicBool::new(false),
                staged: Mutex::new(HashSet::new()),
                fail_next_commit: AtomicBool::new(false),
                calls,
            },
        }
    }

    pub fn blog() -> Self {
        Self::new(blog_schema())
    }

    /// Delegate calls observed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.as_str() == name)
            .count()
    }

    /// Make the next commit fail once.
    pub fn fail_next_commit(&self) {
        self.tx.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Handle on the call log that outlives the store.
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    /// Current rows of an entity type, in insertion order.
    pub fn rows_of<E: Entity>(&self) -> Vec<E> {
        let tables = self.tables.lock();
        tables
            .get(&E::entity_type())
            .map(|table| {
                table
                    .iter()
                    .filter_map(|row| row.downcast_ref::<E>().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn check_open(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn stage(&self, entity_type: EntityType) {
        if self.tx.active.load(Ordering::SeqCst) {
            self.tx.staged.lock().insert(entity_type);
        }
    }

    fn position_of<E: Entity>(table: &Table, key: &E::Key) -> Option<usize> {
        table
            .iter()
            .position(|row| row.downcast_ref::<E>().is_some_and(|e| &e.key() == key))
    }

    fn find_row<E: Entity>(&self, key: &E::Key) -> Option<E> {
        let tables = self.tables.lock();
        let table = tables.get(&E::entity_type())?;
        let pos = Self::position_of::<E>(table, key)?;
        table[pos].downcast_ref::<E>().cloned()
    }
}

impl BlockingStore for MemoryStore {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn insert<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.check_open()?;
        self.log(format!("insert {}", E::entity_type()));
        self.tables
            .lock()
            .entry(E::entity_type())
            .or_default()
            .push(Box::new(entity.clone()));
        self.stage(E::entity_type());
        Ok(entity)
    }

    fn insert_many<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, Error> {
        self.check_open()?;
        self.log(format!("insert_many {}", E::entity_type()));
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        for entity in &entities {
            table.push(Box::new(entity.clone()));
        }
        drop(tables);
        if !entities.is_empty() {
            self.stage(E::entity_type());
        }
        Ok(entities)
    }

    fn update<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.check_open()?;
        self.log(format!("update {}", E::entity_type()));
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        let pos = Self::position_of::<E>(table, &entity.key()).ok_or(Error::NotFound)?;
        table[pos] = Box::new(entity.clone());
        drop(tables);
        self.stage(E::entity_type());
        Ok(entity)
    }

    fn update_fields<E: Entity>(&self, entity: E, fields: &[String]) -> Result<E, Error> {
        self.check_open()?;
        self.log(format!(
            "update_fields {} [{}]",
            E::entity_type(),
            fields.join(",")
        ));
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        let pos = Self::position_of::<E>(table, &entity.key()).ok_or(Error::NotFound)?;
        table[pos] = Box::new(entity.clone());
        drop(tables);
        self.stage(E::entity_type());
        Ok(entity)
    }

    fn update_many<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, Error> {
        self.check_open()?;
        self.log(format!("update_many {}", E::entity_type()));
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        for entity in &entities {
            let pos = Self::position_of::<E>(table, &entity.key()).ok_or(Error::NotFound)?;
            table[pos] = Box::new(entity.clone());
        }
        drop(tables);
        if !entities.is_empty() {
            self.stage(E::entity_type());
        }
        Ok(entities)
    }

    fn upsert<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.check_open()?;
        self.log(format!("upsert {}", E::entity_type()));
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        match Self::position_of::<E>(table, &entity.key()) {
            Some(pos) => table[pos] = Box::new(entity.clone()),
            None => table.push(Box::new(entity.clone())),
        }
        drop(tables);
        self.stage(E::entity_type());
        Ok(entity)
    }

    fn upsert_many<E: Entity>(&self, entities: Vec<E>) -> Result<Vec<E>, Error> {
        self.check_open()?;
        self.log(format!("upsert_many {}", E::entity_type()));
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        for entity in &entities {
            match Self::position_of::<E>(table, &entity.key()) {
                Some(pos) => table[pos] = Box::new(entity.clone()),
                None => table.push(Box::new(entity.clone())),
            }
        }
        drop(tables);
        if !entities.is_empty() {
            self.stage(E::entity_type());
        }
        Ok(entities)
    }

    fn refresh<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.check_open()?;
        self.log(format!("refresh {}", E::entity_type()));
        self.find_row::<E>(&entity.key()).ok_or(Error::NotFound)
    }

    fn refresh_fields<E: Entity>(&self, entity: E, fields: &[String]) -> Result<E, Error> {
        self.check_open()?;
        self.log(format!(
            "refresh_fields {} [{}]",
            E::entity_type(),
            fields.join(",")
        ));
        self.find_row::<E>(&entity.key()).ok_or(Error::NotFound)
    }

    fn refresh_many<E: Entity>(&self, entities: Vec<E>, fields: &[String]) -> Result<Vec<E>, Error> {
        self.check_open()?;
        self.log(format!(
            "refresh_many {} [{}]",
            E::entity_type(),
            fields.join(",")
        ));
        entities
            .iter()
            .map(|entity| self.find_row::<E>(&entity.key()).ok_or(Error::NotFound))
            .collect()
    }

    fn refresh_full<E: Entity>(&self, entity: E) -> Result<E, Error> {
        self.check_open()?;
        self.log(format!("refresh_full {}", E::entity_type()));
        self.find_row::<E>(&entity.key()).ok_or(Error::NotFound)
    }

    fn delete<E: Entity>(&self, entity: E) -> Result<(), Error> {
        self.check_open()?;
        self.log(format!("delete {}", E::entity_type()));
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        let pos = Self::position_of::<E>(table, &entity.key()).ok_or(Error::NotFound)?;
        table.remove(pos);
        drop(tables);
        self.stage(E::entity_type());
        Ok(())
    }

    fn delete_many<E: Entity>(&self, entities: Vec<E>) -> Result<(), Error> {
        self.check_open()?;
        self.log(format!("delete_many {}", E::entity_type()));
        let mut tables = self.tables.lock();
        let table = tables.entry(E::entity_type()).or_default();
        for entity in &entities {
            let pos = Self::position_of::<E>(table, &entity.key()).ok_or(Error::NotFound)?;
            table.remove(pos);
        }
        drop(tables);
        if !entities.is_empty() {
            self.stage(E::entity_type());
        }
        Ok(())
    }

    fn find_by_key<E: Entity>(&self, key: E::Key) -> Result<Option<E>, Error> {
        self.check_open()?;
        self.log(format!("find_by_key {}", E::entity_type()));
        Ok(self.find_row::<E>(&key))
    }

    fn fetch<E: Entity>(&self, query: &Query) -> Result<Vec<E>, Error> {
        self.check_open()?;
        self.log(format!("fetch {}", query.root));
        Ok(self.rows_of::<E>())
    }

    fn count(&self, query: &Query) -> Result<u64, Error> {
        self.check_open()?;
        self.log(format!("count {}", query.root));
        let tables = self.tables.lock();
        Ok(tables.get(&query.root).map_or(0, |table| table.len() as u64))
    }

    // Every existing row counts as affected; filters are not evaluated.
    fn execute_update(&self, spec: &UpdateSpec) -> Result<u64, Error> {
        self.check_open()?;
        self.log(format!("execute_update {}", spec.entity));
        let tables = self.tables.lock();
        let affected = tables.get(&spec.entity).map_or(0, |table| table.len() as u64);
        drop(tables);
        if affected > 0 {
            self.stage(spec.entity.clone());
        }
        Ok(affected)
    }

    fn execute_delete(&self, spec: &DeleteSpec) -> Result<u64, Error> {
        self.check_open()?;
        self.log(format!("execute_delete {}", spec.entity));
        let mut tables = self.tables.lock();
        let affected = tables.get_mut(&spec.entity).map_or(0, |table| {
            let n = table.len() as u64;
            table.clear();
            n
        });
        drop(tables);
        if affected > 0 {
            self.stage(spec.entity.clone());
        }
        Ok(affected)
    }

    fn raw_rows(&self, statement: &str, params: &[Value]) -> Result<Vec<Row>, Error> {
        self.check_open()?;
        self.log(format!("raw_rows {statement}"));
        Ok(vec![Row::new()
            .with("statement", statement)
            .with("params", params.len() as i64)])
    }

    fn raw_entities<E: Entity>(&self, statement: &str, _params: &[Value]) -> Result<Vec<E>, Error> {
        self.check_open()?;
        self.log(format!("raw_entities {statement}"));
        Ok(self.rows_of::<E>())
    }

    fn transaction(&self) -> &dyn StoreTransaction {
        &self.tx
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.log("store_close");
    }
}

impl StoreTransaction for TxControl {
    fn active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), Error> {
        self.calls.lock().push("begin".into());
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(Error::Transaction("transaction already active".into()));
        }
        Ok(())
    }

    fn commit(&self) -> Result<CommitSet, Error> {
        self.calls.lock().push("commit".into());
        if !self.active.load(Ordering::SeqCst) {
            return Err(Error::Transaction("no active transaction".into()));
        }
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(Error::Transaction("commit refused".into()));
        }
        let staged: CommitSet = self.staged.lock().drain().collect();
        self.active.store(false, Ordering::SeqCst);
        Ok(staged)
    }

    fn close(&self) {
        self.calls.lock().push("tx_close".into());
        self.active.store(false, Ordering::SeqCst);
        self.staged.lock().clear();
    }
}

/// Wait briefly for the next commit notification.
pub async fn next_commit(sub: &mut BusSubscription) -> CommitSet {
    tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("timed out waiting for a commit notification")
        .expect("notification stream ended")
}

/// Assert that no commit notification arrives within a short window.
pub async fn assert_silent(sub: &mut BusSubscription) {
    let outcome = tokio::time::timeout(Duration::from_millis(100), sub.recv()).await;
    assert!(outcome.is_err(), "unexpected commit notification");
}
