use async_trait::async_trait;
use burrow_core::error::StorageError;
use burrow_core::repository::{InsertOutcome, LookupKind, RelationStore, Result};
use burrow_core::{Relation, RelationId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

const SELECT_BY_LONG_ID: &str = r#"
    SELECT id, shortUrlId, longUrl, shortUrl
    FROM urlrelations
    WHERE id = $1
    LIMIT 1
"#;

const SELECT_BY_SHORT_ID: &str = r#"
    SELECT id, shortUrlId, longUrl, shortUrl
    FROM urlrelations
    WHERE shortUrlId = $1
    LIMIT 1
"#;

/// Postgres implementation of the relation store contract.
///
/// Expects the `urlrelations` table from `ddl/postgres/urlrelations.sql` to
/// exist; the repository never creates it. Identifiers are stored widened
/// to `BIGINT`, and `id` (the long URL identifier) is the primary key.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository from an existing Postgres connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new Postgres connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_id(row: &PgRow, index: usize) -> Result<RelationId> {
    let raw: i64 = row.try_get(index).map_err(map_sqlx_error)?;
    RelationId::try_from(raw)
        .map_err(|_| StorageError::InvalidData(format!("identifier {raw} does not fit in u32")))
}

fn decode_relation(row: &PgRow) -> Result<Relation> {
    Ok(Relation {
        long_id: decode_id(row, 0)?,
        short_id: decode_id(row, 1)?,
        long_url: row.try_get(2).map_err(map_sqlx_error)?,
        short_url: row.try_get(3).map_err(map_sqlx_error)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl RelationStore for PostgresRepository {
    async fn find(&self, kind: LookupKind, id: RelationId) -> Result<Option<Relation>> {
        let sql = match kind {
            LookupKind::ByShort => SELECT_BY_SHORT_ID,
            LookupKind::ByLong => SELECT_BY_LONG_ID,
        };

        let row = sqlx::query(sql)
            .bind(i64::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(decode_relation).transpose()
    }

    async fn insert(&self, relation: Relation) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO urlrelations (id, shortUrlId, longUrl, shortUrl)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(i64::from(relation.long_id))
        .bind(i64::from(relation.short_id))
        .bind(&relation.long_url)
        .bind(&relation.short_url)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(format!(
                "long id {} is already stored",
                relation.long_id
            ))),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    /// Inserts unless the long id or the short id is already stored.
    ///
    /// A stored long id yields [`InsertOutcome::AlreadyExists`]; a short id
    /// held by another relation is a [`StorageError::Conflict`], as in the
    /// memory backend.
    async fn insert_if_absent(&self, relation: Relation) -> Result<InsertOutcome> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO urlrelations (id, shortUrlId, longUrl, shortUrl)
            SELECT $1::BIGINT, $2::BIGINT, $3::VARCHAR, $4::VARCHAR
            WHERE NOT EXISTS (SELECT 1 FROM urlrelations WHERE shortUrlId = $2::BIGINT)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(i64::from(relation.long_id))
        .bind(i64::from(relation.short_id))
        .bind(&relation.long_url)
        .bind(&relation.short_url)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected()
            > 0;

        if inserted {
            return Ok(InsertOutcome::Inserted(relation));
        }

        debug!(long_id = relation.long_id, "relation not inserted, re-reading by long id");
        match self.find(LookupKind::ByLong, relation.long_id).await? {
            Some(existing) => Ok(InsertOutcome::AlreadyExists(existing)),
            None => Err(StorageError::Conflict(format!(
                "short id {} is already taken",
                relation.short_id
            ))),
        }
    }
}
