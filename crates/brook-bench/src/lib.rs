//! Brook Benchmark Suite
//!
//! This crate provides benchmarks for Brook components using Criterion.
//!
//! # Benchmark Categories
//!
//! - **Notify**: Commit bus publish fan-out, predicate filtering, subscription churn
//! - **Deferred**: Operation round trips through the store worker, keyed lookups, transactions

pub mod fixtures;
pub mod harness;

pub use fixtures::{commit_set, generate_posts, generate_users, Post, Scale, User};
pub use harness::{runtime, BenchContext, MemStore};
