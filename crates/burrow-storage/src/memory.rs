use async_trait::async_trait;
use burrow_core::error::StorageError;
use burrow_core::repository::{InsertOutcome, LookupKind, RelationStore, Result};
use burrow_core::{Relation, RelationId};
use parking_lot::Mutex;
use tracing::trace;

/// In-memory implementation of [`RelationStore`].
///
/// Relations live in insertion order behind a single mutex; lookups are a
/// linear scan and the first match wins. Every read and append takes the
/// lock, and [`RelationStore::insert_if_absent`] runs its check and its
/// append in one critical section.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    relations: Mutex<Vec<Relation>>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            relations: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Number of stored relations.
    pub fn len(&self) -> usize {
        self.relations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.lock().is_empty()
    }
}

fn is_match(relation: &Relation, kind: LookupKind, id: RelationId) -> bool {
    match kind {
        LookupKind::ByShort => relation.short_id == id,
        LookupKind::ByLong => relation.long_id == id,
    }
}

#[async_trait]
impl RelationStore for InMemoryRepository {
    async fn find(&self, kind: LookupKind, id: RelationId) -> Result<Option<Relation>> {
        let relations = self.relations.lock();
        Ok(relations
            .iter()
            .find(|relation| is_match(relation, kind, id))
            .cloned())
    }

    async fn insert(&self, relation: Relation) -> Result<()> {
        trace!(long_id = relation.long_id, short_id = relation.short_id, "appending relation");
        self.relations.lock().push(relation);
        Ok(())
    }

    async fn insert_if_absent(&self, relation: Relation) -> Result<InsertOutcome> {
        let mut relations = self.relations.lock();

        if let Some(existing) = relations
            .iter()
            .find(|r| is_match(r, LookupKind::ByLong, relation.long_id))
        {
            return Ok(InsertOutcome::AlreadyExists(existing.clone()));
        }

        if relations
            .iter()
            .any(|r| is_match(r, LookupKind::ByShort, relation.short_id))
        {
            return Err(StorageError::Conflict(format!(
                "short id {} is already taken",
                relation.short_id
            )));
        }

        relations.push(relation.clone());
        Ok(InsertOutcome::Inserted(relation))
    }
}
