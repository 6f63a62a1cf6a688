use crate::error::StorageError;
use crate::identifier::{derive_id, RelationId};
use crate::relation::Relation;
use async_trait::async_trait;
use std::fmt::Display;
use tracing::trace;

/// Result type for relation store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Which side of a relation a lookup key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// The key is a short code; matched against `short_id`.
    ByShort,
    /// The key is a long URL; matched against `long_id`.
    ByLong,
}

impl Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::ByShort => f.write_str("shortUrl"),
            LookupKind::ByLong => f.write_str("longUrl"),
        }
    }
}

/// Outcome of [`RelationStore::insert_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The relation was stored.
    Inserted(Relation),
    /// A relation with the same `long_id` was already stored; it is returned unchanged.
    AlreadyExists(Relation),
}

/// Persistence contract for relations.
///
/// Implementations must be safe to share across tasks. Absence is reported
/// as `Ok(None)`; every `Err` is a backend fault.
#[async_trait]
pub trait RelationStore: Send + Sync + 'static {
    /// Finds the first relation whose identifier on the `kind` side equals `id`.
    async fn find(&self, kind: LookupKind, id: RelationId) -> Result<Option<Relation>>;

    /// Appends a relation. Callers must have established absence first.
    async fn insert(&self, relation: Relation) -> Result<()>;

    /// Atomically stores `relation` unless one with the same `long_id` exists.
    async fn insert_if_absent(&self, relation: Relation) -> Result<InsertOutcome>;

    /// Derives the identifier of `key` and finds the matching relation.
    async fn lookup(&self, kind: LookupKind, key: &str) -> Result<Option<Relation>> {
        let id = derive_id(key);
        trace!(%kind, key, id, "looking up relation");
        self.find(kind, id).await
    }
}
