/*
 * Responsibility
 * - 認可パイプラインの失敗の種類 (AuthError) を定義する
 * - 各 kind は machine code / description / stage / status を持つ
 * - gate 経由で返す status への畳み込みは gate.rs 側の責務
 */
use axum::http::StatusCode;
use thiserror::Error;

/// Where in the pipeline a failure happened.
///
/// The gate collapses every failure of a stage into one HTTP status, so this is
/// the only property of an error the gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// Pulling the bearer token out of the `Authorization` header.
    Extraction,
    /// Key resolution, signature/claims verification and the permission check.
    Verification,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingHeader,

    /// The description says which part of the header was wrong.
    #[error("{0}")]
    MalformedHeader(&'static str),

    #[error("Authorization malformed.")]
    InvalidHeader,

    #[error("Unable to find the appropriate key.")]
    KeyNotFound,

    #[error("Token algorithm is not accepted.")]
    UnsupportedAlgorithm,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please check the audience and issuer.")]
    InvalidClaims,

    #[error("Unable to parse authentication token.")]
    MalformedToken,

    #[error("Permissions not included in token.")]
    MissingPermissionsClaim,

    #[error("This user does not have permission to perform this action.")]
    PermissionDenied,

    #[error("Timed out fetching signing keys.")]
    KeyFetchTimeout,

    #[error("Signing keys are unavailable.")]
    KeyFetchUnavailable,
}

impl AuthError {
    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "authorization_header_missing",
            Self::MalformedHeader(_)
            | Self::InvalidHeader
            | Self::KeyNotFound
            | Self::UnsupportedAlgorithm
            | Self::MalformedToken => "invalid_header",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims | Self::MissingPermissionsClaim => "invalid_claims",
            Self::PermissionDenied => "invalid_permission",
            Self::KeyFetchTimeout => "key_fetch_timeout",
            Self::KeyFetchUnavailable => "key_fetch_unavailable",
        }
    }

    pub fn stage(&self) -> AuthStage {
        match self {
            Self::MissingHeader | Self::MalformedHeader(_) => AuthStage::Extraction,
            _ => AuthStage::Verification,
        }
    }

    /// Status used when the error is surfaced directly (outside the gate).
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader
            | Self::MalformedHeader(_)
            | Self::InvalidHeader
            | Self::UnsupportedAlgorithm
            | Self::TokenExpired
            | Self::InvalidClaims => StatusCode::UNAUTHORIZED,
            Self::KeyNotFound | Self::MalformedToken | Self::MissingPermissionsClaim => {
                StatusCode::BAD_REQUEST
            }
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::KeyFetchTimeout | Self::KeyFetchUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
