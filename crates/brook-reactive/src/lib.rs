//! Reactive adapter for blocking entity stores.
//!
//! This crate turns a synchronous [`BlockingStore`] into an async,
//! change-aware one. Mutations become deferred operations that run on a
//! dedicated worker thread, committed changes fan out over an in-process
//! bus, and queries can be watched so they re-deliver whenever a commit
//! touches the entity types they depend on.
//!
//! # Quick Start
//!
//! ```ignore
//! use brook_reactive::ReactiveStore;
//! use brook_store::FilterExpr;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ReactiveStore::new(open_store()?);
//!
//!     // Nothing runs until a deferred operation is awaited.
//!     let task = store.insert(Task::new("write docs")).run().await?;
//!
//!     // Watched queries re-deliver after every relevant commit.
//!     let open = store
//!         .select::<Task>()
//!         .filter(FilterExpr::eq("done", false))
//!         .result();
//!     let mut live = open.watch()?;
//!     while let Some(result) = live.recv().await {
//!         println!("{} open tasks", result.rows().await?.len());
//!     }
//!
//!     store.close();
//!     Ok(())
//! }
//! ```

pub mod builders;
pub mod bus;
pub mod config;
pub mod error;
pub mod live;
pub mod ops;
pub mod result;
pub mod store;
pub mod worker;

pub use builders::{BulkDelete, BulkUpdate, CountQuery, Select};
pub use bus::{BusSubscription, CommitBus};
pub use config::{ReactiveConfig, DEFAULT_STREAM_BUFFER};
pub use error::Error;
pub use live::LiveResult;
pub use ops::Deferred;
pub use result::{ResultSet, RowStream};
pub use store::ReactiveStore;
pub use worker::Worker;

// Re-export commonly used types at crate root
pub use brook_schema::{CommitSet, Entity, EntityType, Schema};
pub use brook_store::{BlockingStore, FilterExpr, OrderSpec, Query, Row, StoreTransaction, Value};
