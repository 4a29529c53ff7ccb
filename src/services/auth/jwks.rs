/*
 * Responsibility
 * - 署名鍵セット (JWKS) の取得と、token の kid に一致する鍵の選択
 * - 取得は KeyFetcher trait 越し (HTTP 実装 / テスト用 mock を差し替え可能)
 * - キャッシュは任意 (TTL 付き)。kid が見つからなければ必ず取り直す
 */
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use super::{error::AuthError, verifier::decode_header};

/// One entry of the key set. Only the RSA fields used for verification are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    #[serde(default)]
    pub kty: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default, rename = "use")]
    pub usage: Option<String>,
    #[serde(default)]
    pub n: String,
    #[serde(default)]
    pub e: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKeySet {
    pub keys: Vec<SigningKey>,
}

impl SigningKeySet {
    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<SigningKeySet, AuthError>> + Send + 'a>>;

/// Source of the signing key set.
///
/// Implementations must return the set as currently published; the resolver
/// decides whether an earlier result may be reused.
pub trait KeyFetcher: Send + Sync {
    fn fetch(&self) -> FetchFuture<'_>;
}

/// Fetches the key set from the issuer's well-known endpoint.
#[derive(Debug, Clone)]
pub struct HttpKeyFetcher {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeyFetcher {
    /// `timeout` bounds the whole exchange, body included.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    fn classify(&self, err: reqwest::Error) -> AuthError {
        if err.is_timeout() {
            tracing::warn!(url = %self.url, error = %err, "jwks fetch timed out");
            AuthError::KeyFetchTimeout
        } else {
            tracing::warn!(url = %self.url, error = %err, "jwks fetch failed");
            AuthError::KeyFetchUnavailable
        }
    }
}

impl KeyFetcher for HttpKeyFetcher {
    fn fetch(&self) -> FetchFuture<'_> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.url.clone())
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| self.classify(e))?;

            let status = response.status();
            if !status.is_success() {
                tracing::warn!(url = %self.url, %status, "jwks endpoint returned an error status");
                return Err(AuthError::KeyFetchUnavailable);
            }

            let keys = response
                .json::<SigningKeySet>()
                .await
                .map_err(|e| self.classify(e))?;

            tracing::debug!(url = %self.url, keys = keys.keys.len(), "fetched jwks");
            Ok(keys)
        })
    }
}

struct CachedKeySet {
    fetched_at: Instant,
    keys: Arc<SigningKeySet>,
}

struct KeySetCache {
    ttl: Duration,
    slot: RwLock<Option<CachedKeySet>>,
}

/// Selects the signing key named by a token's `kid`.
///
/// Without a cache every call fetches the key set, so a rotation is visible on
/// the very next call. With a cache, entries older than the TTL are refetched,
/// and a `kid` miss on a cached set always triggers one refetch.
#[derive(Clone)]
pub struct KeyResolver {
    fetcher: Arc<dyn KeyFetcher>,
    cache: Option<Arc<KeySetCache>>,
}

impl std::fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolver")
            .field("cache_ttl", &self.cache.as_ref().map(|c| c.ttl))
            .finish()
    }
}

impl KeyResolver {
    pub fn new(fetcher: Arc<dyn KeyFetcher>) -> Self {
        Self {
            fetcher,
            cache: None,
        }
    }

    /// Enables the key-set cache. A zero TTL leaves caching off.
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = (!ttl.is_zero()).then(|| {
            Arc::new(KeySetCache {
                ttl,
                slot: RwLock::new(None),
            })
        });
        self
    }

    /// Reads `kid` from the token header (without verifying anything) and
    /// returns the matching key.
    pub async fn resolve(&self, token: &str) -> Result<SigningKey, AuthError> {
        let header = decode_header(token)?;

        let kid = header.kid.ok_or(AuthError::InvalidHeader)?;

        self.resolve_kid(&kid).await
    }

    pub async fn resolve_kid(&self, kid: &str) -> Result<SigningKey, AuthError> {
        let (keys, fresh) = self.key_set().await?;

        if let Some(key) = keys.find(kid) {
            return Ok(key.clone());
        }

        if !fresh {
            tracing::debug!(kid, "kid not in cached jwks, refetching");
            let keys = self.refetch().await?;
            if let Some(key) = keys.find(kid) {
                return Ok(key.clone());
            }
        }

        tracing::debug!(kid, "no signing key matches kid");
        Err(AuthError::KeyNotFound)
    }

    /// Returns the key set and whether it was fetched by this call.
    async fn key_set(&self) -> Result<(Arc<SigningKeySet>, bool), AuthError> {
        if let Some(cache) = &self.cache {
            let slot = cache.slot.read().await;
            if let Some(entry) = slot.as_ref()
                && entry.fetched_at.elapsed() < cache.ttl
            {
                return Ok((entry.keys.clone(), false));
            }
        }

        Ok((self.refetch().await?, true))
    }

    async fn refetch(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        let keys = Arc::new(self.fetcher.fetch().await?);

        if let Some(cache) = &self.cache {
            *cache.slot.write().await = Some(CachedKeySet {
                fetched_at: Instant::now(),
                keys: keys.clone(),
            });
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use serde_json::json;

    use super::*;

    /// Serves whatever set is currently stored and counts fetches.
    struct StubFetcher {
        keys: Mutex<Result<SigningKeySet, AuthError>>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn new(keys: Result<SigningKeySet, AuthError>) -> Arc<Self> {
            Arc::new(Self {
                keys: Mutex::new(keys),
                calls: AtomicUsize::new(0),
            })
        }

        fn set(&self, keys: SigningKeySet) {
            *self.keys.lock().unwrap() = Ok(keys);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl KeyFetcher for StubFetcher {
        fn fetch(&self) -> FetchFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let keys = self.keys.lock().unwrap().clone();
            Box::pin(async move { keys })
        }
    }

    fn key(kid: &str) -> SigningKey {
        SigningKey {
            kty: "RSA".into(),
            kid: Some(kid.into()),
            usage: Some("sig".into()),
            n: format!("n-{kid}"),
            e: "AQAB".into(),
        }
    }

    fn set(kids: &[&str]) -> SigningKeySet {
        SigningKeySet {
            keys: kids.iter().map(|k| key(k)).collect(),
        }
    }

    fn token_with_kid(kid: Option<&str>) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = kid.map(String::from);
        jsonwebtoken::encode(
            &header,
            &json!({"sub": "x"}),
            &EncodingKey::from_secret(b"irrelevant"),
        )
        .unwrap()
    }

    #[test]
    fn key_set_parses_well_known_document() {
        let doc = json!({
            "keys": [
                {
                    "alg": "RS256", "kty": "RSA", "use": "sig", "kid": "abc",
                    "n": "nn", "e": "AQAB", "x5c": ["..."]
                },
                {"kty": "EC", "kid": "ec-1", "crv": "P-256", "x": "..", "y": ".."}
            ]
        });
        let keys: SigningKeySet = serde_json::from_value(doc).unwrap();
        let found = keys.find("abc").unwrap();
        assert_eq!(found.kty, "RSA");
        assert_eq!(found.usage.as_deref(), Some("sig"));
        assert_eq!(found.n, "nn");
        assert!(keys.find("missing").is_none());
    }

    #[tokio::test]
    async fn resolves_matching_kid() {
        let fetcher = StubFetcher::new(Ok(set(&["a", "b"])));
        let resolver = KeyResolver::new(fetcher.clone());

        let key = resolver.resolve(&token_with_kid(Some("b"))).await.unwrap();
        assert_eq!(key.kid.as_deref(), Some("b"));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn missing_kid_is_invalid_header() {
        let fetcher = StubFetcher::new(Ok(set(&["a"])));
        let resolver = KeyResolver::new(fetcher.clone());

        let err = resolver.resolve(&token_with_kid(None)).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidHeader);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn undecodable_header_is_malformed_token() {
        let resolver = KeyResolver::new(StubFetcher::new(Ok(set(&["a"]))));
        let err = resolver.resolve("not-a-jwt").await.unwrap_err();
        assert_eq!(err, AuthError::MalformedToken);
    }

    #[tokio::test]
    async fn unknown_kid_is_key_not_found() {
        let fetcher = StubFetcher::new(Ok(set(&["a"])));
        let resolver = KeyResolver::new(fetcher.clone());

        let err = resolver.resolve_kid("zzz").await.unwrap_err();
        assert_eq!(err, AuthError::KeyNotFound);
        // uncached: the fresh fetch is authoritative, no second attempt
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let resolver = KeyResolver::new(StubFetcher::new(Err(AuthError::KeyFetchTimeout)));
        let err = resolver.resolve_kid("a").await.unwrap_err();
        assert_eq!(err, AuthError::KeyFetchTimeout);
    }

    #[tokio::test]
    async fn uncached_resolver_sees_rotation_immediately() {
        let fetcher = StubFetcher::new(Ok(set(&["old"])));
        let resolver = KeyResolver::new(fetcher.clone());

        assert!(resolver.resolve_kid("old").await.is_ok());
        fetcher.set(set(&["new"]));
        assert!(resolver.resolve_kid("new").await.is_ok());
        assert_eq!(resolver.resolve_kid("old").await, Err(AuthError::KeyNotFound));
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn cache_serves_repeat_lookups() {
        let fetcher = StubFetcher::new(Ok(set(&["a"])));
        let resolver = KeyResolver::new(fetcher.clone()).with_cache(Duration::from_secs(300));

        for _ in 0..3 {
            resolver.resolve_kid("a").await.unwrap();
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn cache_refetches_on_kid_miss() {
        let fetcher = StubFetcher::new(Ok(set(&["old"])));
        let resolver = KeyResolver::new(fetcher.clone()).with_cache(Duration::from_secs(300));

        resolver.resolve_kid("old").await.unwrap();
        fetcher.set(set(&["new"]));

        let key = resolver.resolve_kid("new").await.unwrap();
        assert_eq!(key.kid.as_deref(), Some("new"));
        assert_eq!(fetcher.calls(), 2);

        // the refreshed set replaced the cached one
        resolver.resolve_kid("new").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let fetcher = StubFetcher::new(Ok(set(&["a"])));
        let resolver = KeyResolver::new(fetcher.clone()).with_cache(Duration::ZERO);

        resolver.resolve_kid("a").await.unwrap();
        resolver.resolve_kid("a").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }
}
