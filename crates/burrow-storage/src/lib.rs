pub mod memory;
pub mod postgres;

pub use burrow_core::repository::{InsertOutcome, LookupKind, RelationStore};
pub use burrow_core::StorageError;
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
