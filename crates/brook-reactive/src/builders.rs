//! Deferred query and statement builders.
//!
//! Builders accumulate IR from `brook-store` and hand back unexecuted
//! handles. Nothing touches the delegate until the returned [`ResultSet`]
//! or [`Deferred`] is actually run.

use std::marker::PhantomData;
use std::sync::Arc;

use brook_schema::{CommitSet, Entity, EntityType};
use brook_store::{
    BlockingStore, DeleteSpec, FilterExpr, OrderSpec, Query, StoreTransaction, UpdateSpec, Value,
};

use crate::ops::Deferred;
use crate::result::{ResultSet, WatchHandle};
use crate::store::Shared;

/// Builder for an entity query.
pub struct Select<B, E> {
    shared: Arc<Shared<B>>,
    query: Query,
    _entity: PhantomData<fn() -> E>,
}

impl<B: BlockingStore, E: Entity> Select<B, E> {
    pub(crate) fn new(shared: Arc<Shared<B>>) -> Self {
        Self {
            shared,
            query: Query::new(E::entity_type()),
            _entity: PhantomData,
        }
    }

    /// Select only the named fields.
    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.query = self.query.with_fields(fields);
        self
    }

    /// Restrict the query with a filter.
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.query = self.query.with_filter(filter);
        self
    }

    /// Join in a named relation.
    ///
    /// Included relations widen change tracking: the result re-emits on
    /// commits touching the related types as well.
    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.query = self.query.include(relation);
        self
    }

    /// Add an ordering term.
    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.query = self.query.with_order(order);
        self
    }

    /// Cap the number of rows returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.query = self.query.with_limit(limit);
        self
    }

    /// Skip the first `offset` rows.
    pub fn offset(mut self, offset: u32) -> Self {
        self.query = self.query.with_offset(offset);
        self
    }

    /// Finish building.
    ///
    /// The returned handle has not executed anything; it carries the entity
    /// types the query depends on so it can be watched.
    pub fn result(self) -> ResultSet<E> {
        let schema = self.shared.delegate.schema();
        let deps = schema.reachable_types(&self.query.root, &self.query.includes);
        let stream_buffer = self.shared.config.stream_buffer;
        let worker = self.shared.worker.clone();
        let watch = WatchHandle {
            bus: self.shared.bus.clone(),
            schema,
            deps,
        };

        let shared = self.shared;
        let query = self.query;
        let exec = Deferred::new(worker, move || Ok(shared.delegate.fetch::<E>(&query)?));

        ResultSet::watchable(exec, watch, stream_buffer)
    }
}

/// Builder for a row count query.
pub struct CountQuery<B> {
    shared: Arc<Shared<B>>,
    query: Query,
}

impl<B: BlockingStore> CountQuery<B> {
    pub(crate) fn new(shared: Arc<Shared<B>>, root: EntityType) -> Self {
        Self {
            shared,
            query: Query::new(root),
        }
    }

    /// Restrict the count with a filter.
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.query = self.query.with_filter(filter);
        self
    }

    /// Finish building. The deferred count reports matching rows.
    pub fn result(self) -> Deferred<u64> {
        let shared = self.shared;
        let query = self.query;
        let worker = shared.worker.clone();
        Deferred::new(worker, move || Ok(shared.delegate.count(&query)?))
    }
}

/// Builder for a set-based update statement.
pub struct BulkUpdate<B> {
    shared: Arc<Shared<B>>,
    spec: UpdateSpec,
}

impl<B: BlockingStore> BulkUpdate<B> {
    pub(crate) fn new(shared: Arc<Shared<B>>, entity: EntityType) -> Self {
        Self {
            shared,
            spec: UpdateSpec::new(entity),
        }
    }

    /// Assign a value to a field on every matching row.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.spec = self.spec.set(field, value);
        self
    }

    /// Restrict the statement with a filter.
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.spec = self.spec.with_filter(filter);
        self
    }

    /// Finish building. The deferred statement reports affected rows.
    ///
    /// Runs that change at least one row outside a transaction notify the
    /// entity type; a statement matching nothing stays silent.
    pub fn result(self) -> Deferred<u64> {
        let shared = self.shared;
        let spec = self.spec;
        let changes = CommitSet::single(spec.entity.clone());
        let worker = shared.worker.clone();
        Deferred::new(worker, move || {
            let affected = shared.delegate.execute_update(&spec)?;
            if affected > 0 && !shared.delegate.transaction().active() {
                shared.bus.publish(&changes);
            }
            Ok(affected)
        })
    }
}

/// Builder for a set-based delete statement.
pub struct BulkDelete<B> {
    shared: Arc<Shared<B>>,
    spec: DeleteSpec,
}

impl<B: BlockingStore> BulkDelete<B> {
    pub(crate) fn new(shared: Arc<Shared<B>>, entity: EntityType) -> Self {
        Self {
            shared,
            spec: DeleteSpec::new(entity),
        }
    }

    /// Restrict the statement with a filter.
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.spec = self.spec.with_filter(filter);
        self
    }

    /// Finish building. The deferred statement reports affected rows.
    ///
    /// Runs that remove at least one row outside a transaction notify the
    /// entity type; a statement matching nothing stays silent.
    pub fn result(self) -> Deferred<u64> {
        let shared = self.shared;
        let spec = self.spec;
        let changes = CommitSet::single(spec.entity.clone());
        let worker = shared.worker.clone();
        Deferred::new(worker, move || {
            let affected = shared.delegate.execute_delete(&spec)?;
            if affected > 0 && !shared.delegate.transaction().active() {
                shared.bus.publish(&changes);
            }
            Ok(affected)
        })
    }
}
