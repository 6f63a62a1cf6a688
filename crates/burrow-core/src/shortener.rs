use crate::relation::Relation;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the relation for `long_url`, creating it on first submission.
    async fn create_short_link(&self, long_url: &str) -> Result<Relation>;

    /// Resolves a short code. Fails with `NotFound(ByShort)` when unknown.
    async fn resolve_short(&self, code: &str) -> Result<Relation>;

    /// Resolves a long URL. Fails with `NotFound(ByLong)` when unknown.
    async fn resolve_long(&self, long_url: &str) -> Result<Relation>;
}
