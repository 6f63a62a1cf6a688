use async_trait::async_trait;
use burrow_core::{
    InsertOutcome, LookupKind, Relation, RelationStore, ShortCode, Shortener, ShortenerError,
};
use burrow_generator::Generator;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

/// Host the short links are served from unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Upper bound on short code draws per creation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Width of the `longUrl` column.
pub const MAX_LONG_URL_LEN: usize = 200;

/// Width of the `shortUrl` column.
pub const MAX_SHORT_URL_LEN: usize = 100;

#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceSettings {
    /// Base of every short link, e.g. `https://bur.row`.
    #[builder(default = DEFAULT_BASE_URL.to_string(), setter(into))]
    pub base_url: String,
    /// How many generated codes may be rejected before creation fails.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the [`Shortener`] trait.
///
/// This service wraps a [`RelationStore`] and a [`Generator`] to handle:
/// - long URL validation
/// - returning the existing relation for an already shortened URL
/// - drawing short codes until one is free
///
/// The check-then-insert sequence is closed by
/// [`RelationStore::insert_if_absent`]: when a concurrent caller stores the
/// same long URL first, its relation is returned instead.
#[derive(Debug, Clone)]
pub struct RelationService<S, G> {
    store: Arc<S>,
    generator: Arc<G>,
    settings: ServiceSettings,
}

impl<S: RelationStore, G: Generator> RelationService<S, G> {
    /// Creates a service with default settings.
    pub fn new(store: S, generator: G) -> Self {
        Self::with_settings(store, generator, ServiceSettings::default())
    }

    pub fn with_settings(store: S, generator: G, settings: ServiceSettings) -> Self {
        Self::from_shared(Arc::new(store), generator, settings)
    }

    /// Creates a service over a store that the caller keeps a handle to.
    pub fn from_shared(store: Arc<S>, generator: G, settings: ServiceSettings) -> Self {
        Self {
            store,
            generator: Arc::new(generator),
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Validates that the URL is non-empty, fits its column and has an http(s) scheme and host.
    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let chars = url.chars().count();
        if chars > MAX_LONG_URL_LEN {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must be at most {} characters, got {}",
                MAX_LONG_URL_LEN, chars
            )));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        };

        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                scheme
            )));
        }

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        }

        Ok(())
    }

    /// Draws codes until one has no relation, giving up after `max_attempts`.
    async fn free_code(&self) -> Result<ShortCode, ShortenerError> {
        for attempt in 1..=self.settings.max_attempts {
            let code: ShortCode = self.generator.generate().into();

            match self.store.lookup(LookupKind::ByShort, code.as_str()).await? {
                None => {
                    trace!(code = %code, attempt, "short code is free");
                    return Ok(code);
                }
                Some(taken) => {
                    warn!(
                        code = %code,
                        attempt,
                        taken_by = %taken.long_url,
                        "short code already in use, drawing another"
                    );
                }
            }
        }

        Err(ShortenerError::CodeSpaceExhausted {
            attempts: self.settings.max_attempts,
        })
    }

    async fn resolve(&self, kind: LookupKind, key: &str) -> Result<Relation, ShortenerError> {
        match self.store.lookup(kind, key).await? {
            Some(relation) => Ok(relation),
            None => {
                trace!(%kind, key, "relation not found");
                Err(ShortenerError::NotFound(kind))
            }
        }
    }
}

#[async_trait]
impl<S: RelationStore, G: Generator> Shortener for RelationService<S, G> {
    async fn create_short_link(&self, long_url: &str) -> Result<Relation, ShortenerError> {
        Self::validate_url(long_url)?;

        if let Some(existing) = self.store.lookup(LookupKind::ByLong, long_url).await? {
            debug!(long_url, short_url = %existing.short_url, "long url already shortened");
            return Ok(existing);
        }

        let code = self.free_code().await?;
        let relation = Relation::new(long_url, &code, &self.settings.base_url);

        let chars = relation.short_url.chars().count();
        if chars > MAX_SHORT_URL_LEN {
            return Err(ShortenerError::InvalidUrl(format!(
                "short url must be at most {} characters, got {}; shorten the base url",
                MAX_SHORT_URL_LEN, chars
            )));
        }

        match self.store.insert_if_absent(relation).await? {
            InsertOutcome::Inserted(relation) => {
                info!(
                    long_url = %relation.long_url,
                    short_url = %relation.short_url,
                    "created short link"
                );
                Ok(relation)
            }
            InsertOutcome::AlreadyExists(existing) => {
                debug!(
                    long_url,
                    short_url = %existing.short_url,
                    "long url was shortened concurrently, returning stored relation"
                );
                Ok(existing)
            }
        }
    }

    async fn resolve_short(&self, code: &str) -> Result<Relation, ShortenerError> {
        self.resolve(LookupKind::ByShort, code).await
    }

    async fn resolve_long(&self, long_url: &str) -> Result<Relation, ShortenerError> {
        self.resolve(LookupKind::ByLong, long_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_core::repository::Result as StoreResult;
    use burrow_core::{derive_id, RelationId, StorageError};
    use burrow_generator::{RandomGenerator, SeqGenerator};
    use burrow_storage::InMemoryRepository;
    use std::collections::HashSet;

    fn test_service() -> RelationService<InMemoryRepository, RandomGenerator> {
        RelationService::new(InMemoryRepository::new(), RandomGenerator::new())
    }

    fn code_of(relation: &Relation) -> &str {
        relation
            .short_url
            .rsplit('/')
            .next()
            .expect("short url has a code segment")
    }

    /// Always yields the same code.
    struct FixedGenerator(&'static str);

    impl Generator for FixedGenerator {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            ShortCode::new_unchecked(self.0)
        }
    }

    /// Hides relations from long URL lookups, so the service's own
    /// existence check always misses, as it would for a racing caller.
    struct BlindLongLookups(InMemoryRepository);

    #[async_trait]
    impl RelationStore for BlindLongLookups {
        async fn find(&self, kind: LookupKind, id: RelationId) -> StoreResult<Option<Relation>> {
            match kind {
                LookupKind::ByLong => Ok(None),
                LookupKind::ByShort => self.0.find(kind, id).await,
            }
        }

        async fn insert(&self, relation: Relation) -> StoreResult<()> {
            self.0.insert(relation).await
        }

        async fn insert_if_absent(&self, relation: Relation) -> StoreResult<InsertOutcome> {
            self.0.insert_if_absent(relation).await
        }
    }

    /// Fails every operation like an unreachable database.
    struct DownStore;

    #[async_trait]
    impl RelationStore for DownStore {
        async fn find(&self, _: LookupKind, _: RelationId) -> StoreResult<Option<Relation>> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn insert(&self, _: Relation) -> StoreResult<()> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn insert_if_absent(&self, _: Relation) -> StoreResult<InsertOutcome> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn create_then_resolve_scenario() {
        let service = test_service();

        let relation = service
            .create_short_link("http://example.com/a")
            .await
            .unwrap();
        let code = code_of(&relation);
        assert_eq!(code.len(), 10);
        assert_eq!(relation.short_url, format!("http://127.0.0.1:8000/r/{code}"));
        assert_eq!(relation.long_id, derive_id("http://example.com/a"));
        assert_eq!(relation.short_id, derive_id(code));

        let resolved = service.resolve_short(code).await.unwrap();
        assert_eq!(resolved.long_url, "http://example.com/a");

        let err = service.resolve_short("zzzzzzzzzz").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn creation_is_idempotent() {
        let store = Arc::new(InMemoryRepository::new());
        let service = RelationService::from_shared(
            Arc::clone(&store),
            RandomGenerator::new(),
            ServiceSettings::default(),
        );

        let first = service.create_short_link("https://example.com").await.unwrap();
        let second = service.create_short_link("https://example.com").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn resolve_long_returns_created_relation() {
        let service = test_service();

        let created = service.create_short_link("https://example.com").await.unwrap();
        let resolved = service.resolve_long("https://example.com").await.unwrap();

        assert_eq!(created, resolved);
    }

    #[tokio::test]
    async fn not_found_messages() {
        let service = test_service();

        let err = service.resolve_short("doesnotexist").await.unwrap_err();
        assert_eq!(err.to_string(), "Non-existent shortUrl");

        let err = service.resolve_long("http://never-created").await.unwrap_err();
        assert_eq!(err.to_string(), "Non-existent longUrl");
    }

    #[tokio::test]
    async fn sequential_creations_never_share_a_code() {
        let service = test_service();
        let mut codes = HashSet::new();

        for i in 0..200 {
            let relation = service
                .create_short_link(&format!("https://example.com/{i}"))
                .await
                .unwrap();
            assert!(codes.insert(code_of(&relation).to_string()));
        }
    }

    #[tokio::test]
    async fn taken_code_is_skipped() {
        let store = InMemoryRepository::new();
        let squatter = Relation::new(
            "https://squatter.example",
            &ShortCode::new_unchecked("bw00000000"),
            DEFAULT_BASE_URL,
        );
        store.insert(squatter).await.unwrap();
        let service = RelationService::new(store, SeqGenerator::with_prefix("bw"));

        let relation = service.create_short_link("https://example.com").await.unwrap();

        assert_eq!(code_of(&relation), "bw00000001");
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let settings = ServiceSettings::builder().max_attempts(3).build();
        let service = RelationService::with_settings(
            InMemoryRepository::new(),
            FixedGenerator("aaaaaaaaaa"),
            settings,
        );

        service.create_short_link("https://one.example").await.unwrap();
        let err = service
            .create_short_link("https://two.example")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::CodeSpaceExhausted { attempts: 3 }
        ));
    }

    #[tokio::test]
    async fn lost_race_returns_the_stored_relation() {
        let inner = InMemoryRepository::new();
        let winner = Relation::new(
            "https://example.com",
            &ShortCode::new_unchecked("winner0000"),
            DEFAULT_BASE_URL,
        );
        inner.insert(winner.clone()).await.unwrap();
        let store = Arc::new(BlindLongLookups(inner));
        let service = RelationService::from_shared(
            Arc::clone(&store),
            SeqGenerator::with_prefix("bw"),
            ServiceSettings::default(),
        );

        let relation = service.create_short_link("https://example.com").await.unwrap();

        assert_eq!(relation, winner);
        assert_eq!(store.0.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_creators_converge_on_one_relation() {
        let store = Arc::new(InMemoryRepository::new());
        let service = Arc::new(RelationService::from_shared(
            Arc::clone(&store),
            RandomGenerator::new(),
            ServiceSettings::default(),
        ));
        let mut handles = vec![];

        for _ in 0..16 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.create_short_link("https://example.com").await.unwrap()
            }));
        }

        let mut short_urls = HashSet::new();
        for handle in handles {
            short_urls.insert(handle.await.unwrap().short_url);
        }

        assert_eq!(short_urls.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn custom_base_url() {
        let settings = ServiceSettings::builder().base_url("https://bur.row/").build();
        let service = RelationService::with_settings(
            InMemoryRepository::new(),
            SeqGenerator::with_prefix("bw"),
            settings,
        );

        let relation = service.create_short_link("https://example.com").await.unwrap();

        assert_eq!(relation.short_url, "https://bur.row/r/bw00000000");
    }

    #[tokio::test]
    async fn over_long_base_url_is_rejected() {
        let base_url = format!("https://{}.example", "b".repeat(90));
        let settings = ServiceSettings::builder().base_url(base_url).build();
        let service =
            RelationService::with_settings(InMemoryRepository::new(), RandomGenerator::new(), settings);

        let err = service
            .create_short_link("https://example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected() {
        let service = test_service();
        let too_long = format!("https://example.com/{}", "a".repeat(MAX_LONG_URL_LEN));

        for url in ["", "not-a-valid-url", "ftp://example.com", "https://", "http:///path", too_long.as_str()] {
            let err = service.create_short_link(url).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidUrl(_)), "accepted {url:?}");
        }
    }

    #[tokio::test]
    async fn column_widths_count_characters_not_bytes() {
        let service = test_service();

        // 140 characters, 260 bytes
        let accented = format!("https://example.com/{}", "é".repeat(120));
        let relation = service.create_short_link(&accented).await.unwrap();
        assert_eq!(relation.long_url, accented);

        let too_long = format!("https://example.com/{}", "é".repeat(MAX_LONG_URL_LEN));
        let err = service.create_short_link(&too_long).await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl(_)));

        // 99 characters, well over 100 bytes
        let base_url = format!("https://{}.io", "ü".repeat(75));
        let settings = ServiceSettings::builder().base_url(base_url).build();
        let service =
            RelationService::with_settings(InMemoryRepository::new(), RandomGenerator::new(), settings);
        let relation = service.create_short_link("https://example.com").await.unwrap();
        assert_eq!(relation.short_url.chars().count(), 99);
    }

    #[tokio::test]
    async fn backend_faults_propagate() {
        let service = RelationService::new(DownStore, RandomGenerator::new());

        let err = service.resolve_short("abc").await.unwrap_err();
        assert!(matches!(err, ShortenerError::Storage(StorageError::Unavailable(_))));

        let err = service
            .create_short_link("https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::Storage(StorageError::Unavailable(_))));
    }

    #[test]
    fn service_is_usable_as_trait_object() {
        let service: Arc<dyn Shortener> = Arc::new(test_service());
        drop(service);
    }
}
