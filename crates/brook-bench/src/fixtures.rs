//! Test data generation for benchmarks.
//!
//! This module provides consistent data generators for benchmark reproducibility.

use brook_schema::{
    CommitSet, Entity, EntityDef, EntityType, FieldDef, RelationDef, ScalarType, Schema,
};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug)]
pub enum Scale {
    /// Tiny scale: 10 rows per type, a single subscriber.
    /// Use for quick tests and development iteration.
    Tiny,
    /// Small scale: 100 rows per type, 10 subscribers.
    Small,
    /// Medium scale: 2,000 rows per type, 100 subscribers.
    Medium,
    /// Large scale: 20,000 rows per type, 1,000 subscribers.
    Large,
}

impl Scale {
    /// Get the row count per entity type for this scale.
    pub fn rows(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 2_000,
            Scale::Large => 20_000,
        }
    }

    /// Get the bus subscriber count for this scale.
    pub fn subscribers(&self) -> usize {
        match self {
            Scale::Tiny => 1,
            Scale::Small => 10,
            Scale::Medium => 100,
            Scale::Large => 1_000,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Medium
    }
}

/// User entity for benchmarks.
#[derive(Clone, Debug)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub status: String,
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

/// Post entity for benchmarks.
#[derive(Clone, Debug)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub published: bool,
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

/// Generate a random string of specified length.
fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Generate User entities with realistic field distribution.
///
/// Keys start at 1 and are dense, so `id % count` style lookups always hit.
pub fn generate_users(count: usize) -> Vec<User> {
    const SEED: u64 = 12345;
    let mut rng = StdRng::seed_from_u64(SEED);

    let statuses = ["active", "inactive", "pending", "admin"];
    let name_prefixes = [
        "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack",
    ];

    (0..count)
        .map(|i| {
            let name_prefix = name_prefixes[i % name_prefixes.len()];

            User {
                id: i as i64 + 1,
                name: format!("{}_{}", name_prefix, i),
                email: format!("user{}@example{}.com", i, i % 10),
                age: 18 + (rng.gen::<u32>() % 60) as i32,
                status: statuses[i % statuses.len()].to_string(),
            }
        })
        .collect()
}

/// Generate Post entities with foreign keys to Users.
pub fn generate_posts(count: usize, user_ids: &[i64]) -> Vec<Post> {
    const SEED: u64 = 54321;
    let mut rng = StdRng::seed_from_u64(SEED);

    (0..count)
        .map(|i| Post {
            id: i as i64 + 1,
            author_id: user_ids[i % user_ids.len()],
            title: format!("Post Title {}: {}", i, random_string(&mut rng, 20)),
            published: rng.gen_bool(0.8),
        })
        .collect()
}

/// Create the blog schema (User -> Posts).
pub fn blog_schema() -> Schema {
    let user = EntityDef::new("User", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("name", ScalarType::String))
        .with_field(FieldDef::new("email", ScalarType::String))
        .with_field(FieldDef::new("age", ScalarType::Int32))
        .with_field(FieldDef::new("status", ScalarType::String));

    let post = EntityDef::new("Post", "id")
        .with_field(FieldDef::new("id", ScalarType::Int64))
        .with_field(FieldDef::new("author_id", ScalarType::Int64))
        .with_field(FieldDef::new("title", ScalarType::String))
        .with_field(FieldDef::new("published", ScalarType::Bool));

    let posts = RelationDef::one_to_many("posts", "Post", "author_id", "User", "id");

    Schema::new()
        .with_entity(user)
        .with_entity(post)
        .with_relation(posts)
}

/// Build a commit set from entity type names.
pub fn commit_set(names: &[&str]) -> CommitSet {
    names.iter().map(|name| EntityType::from(*name)).collect()
}
