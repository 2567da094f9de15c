//! Blocking store interface for brook.
//!
//! This crate defines the synchronous contract a storage backend has to meet
//! before the reactive layer in `brook-reactive` can wrap it. Backends block
//! the calling thread; the reactive layer takes care of keeping that blocking
//! work off async executors.
//!
//! # Modules
//!
//! - [`store`] - The [`BlockingStore`] and [`StoreTransaction`] traits
//! - [`query`] - Query IR passed to the store
//! - [`mutation`] - Set-based update and delete IR
//! - [`value`] - Runtime value types
//! - [`error`] - Store error types

pub mod error;
pub mod mutation;
pub mod query;
pub mod store;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use mutation::{DeleteSpec, UpdateSpec};
pub use query::{FilterExpr, OrderDirection, OrderSpec, Query};
pub use store::{BlockingStore, Row, StoreTransaction};
pub use value::Value;
