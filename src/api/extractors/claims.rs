use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::VerifiedClaims;

/// Handler で、 gate が検証した claims を受け取るための extractor
/// permission middleware が VerifiedClaims を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す (route に gate が掛かっていない)
pub struct Claims(pub VerifiedClaims);

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedClaims>()
            .cloned()
            .map(Claims)
            .ok_or(AppError::Unauthorized)
    }
}
