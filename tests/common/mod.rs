#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use coffee_shop::config::AuthConfig;
use coffee_shop::services::auth::{
    AuthError, AuthGate, FetchFuture, KeyFetcher, KeyResolver, SigningKey, SigningKeySet,
    TokenVerifier,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use url::Url;

pub const ISSUER: &str = "https://coffee.example.auth0.com/";
pub const AUDIENCE: &str = "coffee";
pub const KID: &str = "test-key-1";
pub const OTHER_KID: &str = "test-key-2";

pub fn auth_config(jwks_url: Url) -> AuthConfig {
    AuthConfig {
        issuer: ISSUER.into(),
        audience: AUDIENCE.into(),
        jwks_url,
        algorithms: vec![Algorithm::RS256],
        leeway_seconds: 0,
        jwks_timeout: Duration::from_secs(5),
        jwks_cache_ttl: Duration::ZERO,
    }
}

pub fn public_key() -> SigningKey {
    serde_json::from_str(include_str!("../fixtures/rsa_public.jwk.json")).unwrap()
}

pub fn other_public_key() -> SigningKey {
    serde_json::from_str(include_str!("../fixtures/rsa_other_public.jwk.json")).unwrap()
}

pub fn key_set() -> SigningKeySet {
    SigningKeySet {
        keys: vec![public_key()],
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn claims_with(permissions: &[&str]) -> Value {
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "auth0|barista",
        "iat": now(),
        "exp": now() + 3600,
        "permissions": permissions,
    })
}

pub fn sign_with(claims: &Value, kid: &str, pem: &[u8]) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.into());
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_rsa_pem(pem).unwrap()).unwrap()
}

pub fn sign(claims: &Value) -> String {
    sign_with(claims, KID, include_bytes!("../fixtures/rsa_private.pem"))
}

pub fn sign_other(claims: &Value) -> String {
    sign_with(
        claims,
        OTHER_KID,
        include_bytes!("../fixtures/rsa_other_private.pem"),
    )
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// In-memory key source. The published set can be swapped to simulate rotation.
#[derive(Default)]
pub struct StubFetcher {
    keys: Mutex<Option<SigningKeySet>>,
    failure: Mutex<Option<AuthError>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn serving(keys: SigningKeySet) -> Arc<Self> {
        Arc::new(Self {
            keys: Mutex::new(Some(keys)),
            ..Self::default()
        })
    }

    pub fn failing(err: AuthError) -> Arc<Self> {
        Arc::new(Self {
            failure: Mutex::new(Some(err)),
            ..Self::default()
        })
    }

    pub fn publish(&self, keys: SigningKeySet) {
        *self.keys.lock().unwrap() = Some(keys);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeyFetcher for StubFetcher {
    fn fetch(&self) -> FetchFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(self.keys.lock().unwrap().clone().unwrap_or_default()),
        };
        Box::pin(async move { result })
    }
}

pub fn gate_with(fetcher: Arc<StubFetcher>) -> AuthGate {
    let config = auth_config(
        Url::parse("https://coffee.example.auth0.com/.well-known/jwks.json").unwrap(),
    );
    AuthGate::new(KeyResolver::new(fetcher), TokenVerifier::new(&config))
}
