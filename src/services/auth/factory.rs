/// Factory: build the `AuthGate` from `AuthConfig`.
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::services::auth::{AuthGate, HttpKeyFetcher, KeyResolver, TokenVerifier};

pub fn build_auth_gate(config: &AuthConfig) -> Result<AuthGate, reqwest::Error> {
    let fetcher = HttpKeyFetcher::new(config.jwks_url.clone(), config.jwks_timeout)?;
    let resolver = KeyResolver::new(Arc::new(fetcher)).with_cache(config.jwks_cache_ttl);
    let verifier = TokenVerifier::new(config);

    tracing::info!(
        issuer = %config.issuer,
        audience = %config.audience,
        jwks_url = %config.jwks_url,
        algorithms = ?config.algorithms,
        cache_ttl_secs = config.jwks_cache_ttl.as_secs(),
        "auth gate configured"
    );

    Ok(AuthGate::new(resolver, verifier))
}
