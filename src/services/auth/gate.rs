/*
 * Responsibility
 * - Extractor → KeyResolver → Verifier → Permission check を 1 本のパイプラインとして合成する
 * - 失敗を stage ごとに HTTP status (401/403) へ畳み込む (対応表は gate_status)
 * - 保護対象の処理を `guard()` で包み、成功時のみ claims を渡して呼ぶ
 */
use std::{future::Future, sync::Arc};

use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;

use super::{
    bearer::extract_bearer,
    claims::VerifiedClaims,
    error::{AuthError, AuthStage},
    jwks::KeyResolver,
    permissions::check_permissions,
    verifier::TokenVerifier,
};

/// Status the gate answers with for a failure in `stage`.
///
/// | stage        | status |
/// |--------------|--------|
/// | Extraction   | 401    |
/// | Verification | 403    |
///
/// Key-service failures belong to `Verification` and are therefore 403 as well.
pub fn gate_status(stage: AuthStage) -> StatusCode {
    match stage {
        AuthStage::Extraction => StatusCode::UNAUTHORIZED,
        AuthStage::Verification => StatusCode::FORBIDDEN,
    }
}

/// A request the gate refused. `cause` is for logs and tests; callers only
/// see `status`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rejected with {status}: {cause}")]
pub struct Rejection {
    pub status: StatusCode,
    pub cause: AuthError,
}

impl From<AuthError> for Rejection {
    fn from(cause: AuthError) -> Self {
        Self {
            status: gate_status(cause.stage()),
            cause,
        }
    }
}

/// Stateless authorization pipeline. Cheap to clone and safe to share
/// between concurrent requests.
#[derive(Debug, Clone)]
pub struct AuthGate {
    inner: Arc<GateInner>,
}

#[derive(Debug)]
struct GateInner {
    resolver: KeyResolver,
    verifier: TokenVerifier,
}

impl AuthGate {
    pub fn new(resolver: KeyResolver, verifier: TokenVerifier) -> Self {
        Self {
            inner: Arc::new(GateInner { resolver, verifier }),
        }
    }

    /// Resolves the signing key and verifies `token`. No permission check.
    pub async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        let key = self.inner.resolver.resolve(token).await?;
        self.inner.verifier.verify(token, &key)
    }

    /// Runs the whole pipeline for one request.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        permission: &str,
    ) -> Result<VerifiedClaims, Rejection> {
        let result = match extract_bearer(headers) {
            Ok(token) => self.verify_and_check(token, permission).await,
            Err(err) => Err(err),
        };

        result.map_err(|cause| {
            let rejection = Rejection::from(cause);
            tracing::warn!(
                permission,
                code = rejection.cause.code(),
                cause = %rejection.cause,
                status = rejection.status.as_u16(),
                "request rejected by auth gate"
            );
            rejection
        })
    }

    async fn verify_and_check(
        &self,
        token: &str,
        permission: &str,
    ) -> Result<VerifiedClaims, AuthError> {
        let claims = self.verify(token).await?;
        check_permissions(permission, &claims)?;
        Ok(claims)
    }

    /// Wraps `op` so that it only runs for requests granted `permission`.
    ///
    /// ```ignore
    /// let detail = gate.guard("get:drinks-detail", |claims, id: i64| async move {
    ///     load_drink(claims.sub, id).await
    /// });
    /// let drink = detail.call(&headers, 7).await?;
    /// ```
    pub fn guard<F>(&self, permission: impl Into<String>, op: F) -> Guarded<F> {
        Guarded {
            gate: self.clone(),
            permission: permission.into(),
            op,
        }
    }
}

/// An operation behind the gate. See [`AuthGate::guard`].
#[derive(Clone)]
pub struct Guarded<F> {
    gate: AuthGate,
    permission: String,
    op: F,
}

impl<F> Guarded<F> {
    pub fn permission(&self) -> &str {
        &self.permission
    }

    /// Authorizes the request, then invokes the wrapped operation once with
    /// the verified claims prepended to `args`. On rejection the operation is
    /// not invoked.
    pub async fn call<A, Fut>(&self, headers: &HeaderMap, args: A) -> Result<Fut::Output, Rejection>
    where
        F: Fn(VerifiedClaims, A) -> Fut,
        Fut: Future,
    {
        let claims = self.gate.authorize(headers, &self.permission).await?;
        Ok((self.op)(claims, args).await)
    }
}
