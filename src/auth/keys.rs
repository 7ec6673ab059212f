use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use lru::LruCache;
use std::{
    collections::HashMap,
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell, RwLock};

/// KeySetError
///
/// Why the issuer's key set could not be obtained. Cloneable so that one fetch's
/// outcome can be handed to every request waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Transport(String),
    #[error("key set endpoint answered with status {0}")]
    Status(u16),
    #[error("key set response could not be decoded: {0}")]
    Decode(String),
    #[error("key set fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// KeyResolveError
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyResolveError {
    #[error("issuer publishes no signing key with id '{0}'")]
    UnknownKey(String),
    #[error(transparent)]
    Unavailable(#[from] KeySetError),
}

/// KeySetSource
///
/// Where the issuer's JSON Web Key Set comes from. The HTTP implementation is used at
/// runtime; `MockKeySetSource` stands in for it in tests.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

/// HttpKeySetSource
///
/// Fetches the key set from the issuer's well-known endpoint
/// (`https://<domain>/.well-known/jwks.json`).
pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySetSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySetError::Status(status.as_u16()));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| KeySetError::Decode(e.to_string()))
    }
}

/// MockKeySetSource
///
/// In-memory key set source that counts how often it is asked. An optional delay keeps
/// a fetch in flight long enough for concurrent callers to pile up behind it.
pub struct MockKeySetSource {
    response: Mutex<Result<JwkSet, KeySetError>>,
    delay: Duration,
    fetches: AtomicUsize,
}

impl MockKeySetSource {
    pub fn new(keys: JwkSet) -> Self {
        Self {
            response: Mutex::new(Ok(keys)),
            delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: KeySetError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replaces what subsequent fetches return, e.g. to simulate key rotation.
    pub async fn set_response(&self, response: Result<JwkSet, KeySetError>) {
        *self.response.lock().await = response;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetSource for MockKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.lock().await.clone()
    }
}

type Flight = Arc<OnceCell<Result<Option<Jwk>, KeySetError>>>;

/// How many key ids the issuer does not publish are remembered before the oldest is
/// forgotten.
pub const DEFAULT_UNKNOWN_KEY_CAPACITY: NonZeroUsize = NonZeroUsize::new(256).unwrap();

/// KeyStore
///
/// Process-wide cache of the issuer's signing keys, indexed by key id. Starts empty and
/// is only ever filled by the fetch path below; nothing is fetched ahead of need.
///
/// A cache miss starts at most one fetch per key id: callers arriving while that fetch
/// is running wait on the same `OnceCell` and share its outcome, and the flight is
/// removed once it lands. A successful fetch replaces the whole cache, which picks up
/// key rotation. A key id the fetched set does not contain goes into a bounded LRU of
/// unknown ids and is rejected without fetching until it is evicted. A failed fetch is
/// not remembered, so a later request may try again.
pub struct KeyStore {
    source: Arc<dyn KeySetSource>,
    fetch_timeout: Duration,
    keys: RwLock<HashMap<String, Jwk>>,
    unknown: Mutex<LruCache<String, ()>>,
    flights: Mutex<HashMap<String, Flight>>,
}

impl KeyStore {
    pub fn new(source: Arc<dyn KeySetSource>, fetch_timeout: Duration) -> Self {
        Self {
            source,
            fetch_timeout,
            keys: RwLock::new(HashMap::new()),
            unknown: Mutex::new(LruCache::new(DEFAULT_UNKNOWN_KEY_CAPACITY)),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Caps how many unknown key ids are remembered.
    pub fn with_unknown_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.unknown = Mutex::new(LruCache::new(capacity));
        self
    }

    pub async fn resolve(&self, kid: &str) -> Result<Jwk, KeyResolveError> {
        if let Some(known) = self.lookup(kid).await {
            return known.ok_or_else(|| KeyResolveError::UnknownKey(kid.to_string()));
        }

        let flight = {
            let mut flights = self.flights.lock().await;
            flights.entry(kid.to_string()).or_default().clone()
        };

        let outcome = flight.get_or_init(|| self.fill(kid)).await.clone();
        self.land(kid, &flight).await;

        match outcome {
            Ok(Some(jwk)) => Ok(jwk),
            Ok(None) => Err(KeyResolveError::UnknownKey(kid.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of signing keys currently cached.
    pub async fn cached_keys(&self) -> usize {
        self.keys.read().await.len()
    }

    /// Number of key ids currently remembered as unknown.
    pub async fn remembered_unknown_keys(&self) -> usize {
        self.unknown.lock().await.len()
    }

    // `Some(Some(_))` cached, `Some(None)` known to be unpublished, `None` not seen.
    async fn lookup(&self, kid: &str) -> Option<Option<Jwk>> {
        if let Some(jwk) = self.keys.read().await.get(kid) {
            return Some(Some(jwk.clone()));
        }
        self.unknown.lock().await.get(kid).map(|_| None)
    }

    // Body of a flight. A flight that landed between the caller's lookup and it joining
    // this one may already have settled the kid.
    async fn fill(&self, kid: &str) -> Result<Option<Jwk>, KeySetError> {
        if let Some(known) = self.lookup(kid).await {
            return Ok(known);
        }
        self.refresh(kid).await
    }

    async fn refresh(&self, kid: &str) -> Result<Option<Jwk>, KeySetError> {
        tracing::info!(kid, "signing key not cached, fetching issuer key set");

        let set = tokio::time::timeout(self.fetch_timeout, self.source.fetch())
            .await
            .map_err(|_| KeySetError::Timeout(self.fetch_timeout))??;

        let fresh: HashMap<String, Jwk> = set
            .keys
            .into_iter()
            .filter_map(|jwk| jwk.common.key_id.clone().map(|id| (id, jwk)))
            .collect();

        tracing::debug!(keys = fresh.len(), "issuer key set refreshed");

        let found = fresh.get(kid).cloned();
        {
            let mut unknown = self.unknown.lock().await;
            for id in fresh.keys() {
                unknown.pop(id);
            }
            if found.is_none() {
                unknown.put(kid.to_string(), ());
            }
        }
        *self.keys.write().await = fresh;
        Ok(found)
    }

    // Removes a finished flight, unless a newer one has already replaced it.
    async fn land(&self, kid: &str, flight: &Flight) {
        let mut flights = self.flights.lock().await;
        if flights.get(kid).is_some_and(|current| Arc::ptr_eq(current, flight)) {
            flights.remove(kid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn empty_store(capacity: usize) -> (Arc<MockKeySetSource>, KeyStore) {
        let source = Arc::new(MockKeySetSource::new(JwkSet { keys: Vec::new() }));
        let store = KeyStore::new(source.clone(), TIMEOUT)
            .with_unknown_capacity(NonZeroUsize::new(capacity).unwrap());
        (source, store)
    }

    #[tokio::test]
    async fn unknown_kids_are_bounded_and_flights_are_released() {
        let (source, store) = empty_store(4);

        for i in 0..100 {
            let err = store.resolve(&format!("kid-{i}")).await.unwrap_err();
            assert_eq!(err, KeyResolveError::UnknownKey(format!("kid-{i}")));
        }

        assert_eq!(source.fetch_count(), 100);
        assert_eq!(store.remembered_unknown_keys().await, 4);
        assert!(store.flights.lock().await.is_empty());
    }

    #[tokio::test]
    async fn evicted_unknown_kid_is_fetched_again() {
        let (source, store) = empty_store(2);

        for kid in ["a", "b", "c"] {
            let _ = store.resolve(kid).await;
        }
        assert_eq!(source.fetch_count(), 3);

        // "c" is still remembered, "a" was evicted.
        let _ = store.resolve("c").await;
        assert_eq!(source.fetch_count(), 3);
        let _ = store.resolve("a").await;
        assert_eq!(source.fetch_count(), 4);
    }

    #[tokio::test]
    async fn flight_joined_after_a_landing_does_not_refetch() {
        let (source, store) = empty_store(4);
        let jwk: Jwk = serde_json::from_value(serde_json::json!({
            "kty": "RSA", "kid": "late", "alg": "RS256", "use": "sig",
            "n": include_str!("../../tests/fixtures/trusted.n").trim(),
            "e": "AQAB"
        }))
        .unwrap();
        store.keys.write().await.insert("late".to_string(), jwk);

        let found = store.fill("late").await.unwrap();

        assert!(found.is_some());
        assert_eq!(source.fetch_count(), 0);
    }
}
