use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, errors::ErrorKind};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{
    claims::{TokenAudience, VerifiedClaims},
    error::AuthError,
    jwks::SigningKey,
};
use crate::config::AuthConfig;

/// Decodes the token header without verifying anything.
///
/// A header that names an algorithm `jsonwebtoken` does not know (`none`,
/// `HS999`, ...) is still a declared algorithm outside the allow-list, so it is
/// reported as `UnsupportedAlgorithm` rather than `MalformedToken`.
pub(super) fn decode_header(token: &str) -> Result<Header, AuthError> {
    jsonwebtoken::decode_header(token).map_err(|e| {
        tracing::debug!(error = %e, "unable to decode token header");
        if declares_unknown_algorithm(token) {
            AuthError::UnsupportedAlgorithm
        } else {
            AuthError::MalformedToken
        }
    })
}

fn declares_unknown_algorithm(token: &str) -> bool {
    let Some(segment) = token.split('.').next() else {
        return false;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')) else {
        return false;
    };
    let Ok(Value::Object(header)) = serde_json::from_slice::<Value>(&bytes) else {
        return false;
    };

    header
        .get("alg")
        .and_then(Value::as_str)
        .is_some_and(|alg| Algorithm::from_str(alg).is_err())
}

/// RSA signature + claims verifier.
///
/// Checks run in this order: algorithm allow-list, signature and structure,
/// expiry, audience, issuer. The first failure wins.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    issuer: String,
    audience: String,
    algorithms: Vec<Algorithm>,
    leeway_seconds: u64,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            algorithms: config.algorithms.clone(),
            leeway_seconds: config.leeway_seconds,
        }
    }

    pub fn verify(&self, token: &str, key: &SigningKey) -> Result<VerifiedClaims, AuthError> {
        self.verify_at(token, key, chrono::Utc::now().timestamp())
    }

    /// Same as [`verify`](Self::verify) with an explicit clock (unix seconds).
    pub fn verify_at(
        &self,
        token: &str,
        key: &SigningKey,
        now: i64,
    ) -> Result<VerifiedClaims, AuthError> {
        let header = decode_header(token)?;

        if !self.algorithms.contains(&header.alg) {
            tracing::debug!(alg = ?header.alg, "token algorithm not in allow-list");
            return Err(AuthError::UnsupportedAlgorithm);
        }

        if !key.kty.eq_ignore_ascii_case("RSA") {
            tracing::debug!(kty = %key.kty, "signing key is not an RSA key");
            return Err(AuthError::MalformedToken);
        }

        let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e)
            .map_err(|_| AuthError::MalformedToken)?;

        // jsonwebtoken only checks the signature here; exp/aud/iss are compared
        // below on the raw map so that the check order and the error kinds are ours.
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let raw = jsonwebtoken::decode::<Map<String, Value>>(token, &decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(kind = ?e.kind(), "token decode failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => {
                        AuthError::InvalidClaims
                    }
                    _ => AuthError::MalformedToken,
                }
            })?
            .claims;

        let exp = raw
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(AuthError::MalformedToken)?;

        let leeway = i64::try_from(self.leeway_seconds).unwrap_or(i64::MAX);
        if now >= exp.saturating_add(leeway) {
            return Err(AuthError::TokenExpired);
        }

        let audience_ok = raw
            .get("aud")
            .and_then(|v| TokenAudience::deserialize(v).ok())
            .is_some_and(|aud| aud.contains(&self.audience));
        let issuer_ok = raw.get("iss").and_then(Value::as_str) == Some(self.issuer.as_str());

        if !audience_ok || !issuer_ok {
            return Err(AuthError::InvalidClaims);
        }

        let claims = VerifiedClaims::deserialize(Value::Object(raw)).map_err(|e| {
            tracing::debug!(error = %e, "unexpected claim shape");
            AuthError::MalformedToken
        })?;

        Ok(claims)
    }
}
