//! Brook: reactive change notification over blocking entity stores.
//!
//! This crate bundles the Brook workspace behind one dependency:
//!
//! - [`schema`]: entity type identifiers, schema definitions, commit sets
//! - [`store`]: the synchronous [`BlockingStore`] contract a backend implements
//! - [`reactive`]: the async adapter, deferred operations, and the commit bus
//!
//! Most applications only need the types re-exported at the crate root.
//!
//! # Quick Start
//!
//! ```ignore
//! use brook::{Entity, EntityType, ReactiveStore};
//!
//! #[derive(Clone)]
//! struct Task {
//!     id: i64,
//!     text: String,
//!     done: bool,
//! }
//!
//! impl Entity for Task {
//!     type Key = i64;
//!
//!     fn entity_type() -> EntityType {
//!         EntityType::from("Task")
//!     }
//!
//!     fn key(&self) -> i64 {
//!         self.id
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ReactiveStore::new(open_store()?);
//!
//!     let mut changes = store.changes();
//!     store.insert(Task { id: 1, text: "write docs".into(), done: false })
//!         .run()
//!         .await?;
//!     let committed = changes.recv().await.unwrap();
//!     assert!(committed.contains_name("Task"));
//!
//!     store.close();
//!     Ok(())
//! }
//! ```

pub use brook_reactive as reactive;
pub use brook_schema as schema;
pub use brook_store as store;

// The working surface, flattened.
pub use brook_reactive::{
    BulkDelete, BulkUpdate, BusSubscription, CommitBus, CountQuery, Deferred, LiveResult,
    ReactiveConfig, ReactiveStore, ResultSet, RowStream, Select, Worker,
};
pub use brook_schema::{
    CommitSet, Entity, EntityDef, EntityType, FieldDef, RelationDef, ScalarType, Schema,
};
pub use brook_store::{
    BlockingStore, DeleteSpec, FilterExpr, OrderSpec, Query, Row, StoreTransaction, UpdateSpec,
    Value,
};

/// The reactive layer's error type.
pub use brook_reactive::Error;

/// The blocking store's error type.
pub use brook_store::Error as StoreError;
