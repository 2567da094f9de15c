//! Commit change sets.

use std::collections::hash_set;
use std::collections::HashSet;

use crate::types::EntityType;

/// The set of entity types touched by one committed transaction.
///
/// Created once per commit and handed to the notification bus; subscribers
/// only ever read it. An empty set is never published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSet {
    types: HashSet<EntityType>,
}

impl CommitSet {
    /// Create an empty commit set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a commit set containing a single entity type.
    pub fn single(entity_type: EntityType) -> Self {
        let mut types = HashSet::with_capacity(1);
        types.insert(entity_type);
        Self { types }
    }

    /// Add an entity type. Returns false if it was already present.
    pub fn insert(&mut self, entity_type: EntityType) -> bool {
        self.types.insert(entity_type)
    }

    /// Merge another commit set into this one.
    pub fn merge(&mut self, other: &CommitSet) {
        for entity_type in &other.types {
            self.types.insert(entity_type.clone());
        }
    }

    /// Check whether an entity type is in the set.
    pub fn contains(&self, entity_type: &EntityType) -> bool {
        self.types.contains(entity_type)
    }

    /// Check whether an entity type name is in the set.
    pub fn contains_name(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    /// Check whether any of the given types is in the set.
    pub fn intersects(&self, other: &HashSet<EntityType>) -> bool {
        if self.types.len() <= other.len() {
            self.types.iter().any(|t| other.contains(t))
        } else {
            other.iter().any(|t| self.types.contains(t))
        }
    }

    /// Number of entity types in the set.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over the entity types.
    pub fn iter(&self) -> hash_set::Iter<'_, EntityType> {
        self.types.iter()
    }
}

impl FromIterator<EntityType> for CommitSet {
    fn from_iter<I: IntoIterator<Item = EntityType>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

impl Extend<EntityType> for CommitSet {
    fn extend<I: IntoIterator<Item = EntityType>>(&mut self, iter: I) {
        self.types.extend(iter);
    }
}

impl<'a> IntoIterator for &'a CommitSet {
    type Item = &'a EntityType;
    type IntoIter = hash_set::Iter<'a, EntityType>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_contains() {
        let set = CommitSet::single(EntityType::from("User"));

        assert_eq!(set.len(), 1);
        assert!(set.contains(&EntityType::from("User")));
        assert!(set.contains_name("User"));
        assert!(!set.contains_name("Post"));
    }

    #[test]
    fn test_merge_deduplicates() {
        let mut a = CommitSet::single(EntityType::from("User"));
        let b: CommitSet = [EntityType::from("User"), EntityType::from("Post")]
            .into_iter()
            .collect();

        a.merge(&b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_intersects() {
        let set: CommitSet = [EntityType::from("User"), EntityType::from("Post")]
            .into_iter()
            .collect();

        let mut watched = HashSet::new();
        watched.insert(EntityType::from("Post"));
        assert!(set.intersects(&watched));

        let mut disjoint = HashSet::new();
        disjoint.insert(EntityType::from("Comment"));
        assert!(!set.intersects(&disjoint));

        assert!(!set.intersects(&HashSet::new()));
        assert!(!CommitSet::new().intersects(&watched));
    }
}
