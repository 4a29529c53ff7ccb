/*
 * Responsibility
 * - `Authorization: Bearer <token>` からトークン文字列を取り出す
 * - 検証はしない (署名/claims は verifier の責務)
 */
use axum::http::{HeaderMap, header};

use super::error::AuthError;

/// Returns the second segment of the `Authorization` header, unmodified.
///
/// The header must consist of exactly two whitespace-delimited segments, the
/// first of which is `bearer` in any case.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingHeader),
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::MalformedHeader("Authorization header must be bearer token"))?;

    let mut parts = value.split_whitespace();

    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => {}
        _ => {
            return Err(AuthError::MalformedHeader(
                "Authorization header must start with \"Bearer\"",
            ));
        }
    }

    let token = parts
        .next()
        .ok_or(AuthError::MalformedHeader("Token not found"))?;

    if parts.next().is_some() {
        return Err(AuthError::MalformedHeader(
            "Authorization header must be bearer token",
        ));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn returns_second_segment() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(extract_bearer(&headers("bearer tok")), Ok("tok"));
        assert_eq!(extract_bearer(&headers("BEARER tok")), Ok("tok"));
        assert_eq!(extract_bearer(&headers("BeArEr tok")), Ok("tok"));
    }

    #[test]
    fn token_is_not_modified() {
        // case and punctuation of the token itself are preserved
        assert_eq!(extract_bearer(&headers("Bearer AbC-_.=")), Ok("AbC-_.="));
    }

    #[test]
    fn missing_header() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Err(AuthError::MissingHeader));
    }

    #[test]
    fn empty_header_counts_as_missing() {
        assert_eq!(extract_bearer(&headers("")), Err(AuthError::MissingHeader));
    }

    #[test]
    fn wrong_scheme() {
        let err = extract_bearer(&headers("Basic dXNlcjpwYXNz")).unwrap_err();
        assert!(matches!(err, AuthError::MalformedHeader(_)));

        let err = extract_bearer(&headers("Bearertoken")).unwrap_err();
        assert!(matches!(err, AuthError::MalformedHeader(_)));
    }

    #[test]
    fn scheme_without_token() {
        assert_eq!(
            extract_bearer(&headers("Bearer")),
            Err(AuthError::MalformedHeader("Token not found"))
        );
        assert_eq!(
            extract_bearer(&headers("Bearer   ")),
            Err(AuthError::MalformedHeader("Token not found"))
        );
    }

    #[test]
    fn too_many_segments() {
        assert_eq!(
            extract_bearer(&headers("Bearer a b")),
            Err(AuthError::MalformedHeader(
                "Authorization header must be bearer token"
            ))
        );
    }

    #[test]
    fn whitespace_only_header_is_malformed() {
        let err = extract_bearer(&headers("   ")).unwrap_err();
        assert!(matches!(err, AuthError::MalformedHeader(_)));
    }

    #[test]
    fn non_ascii_header_is_malformed() {
        let mut map = HeaderMap::new();
        map.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );
        assert!(matches!(
            extract_bearer(&map),
            Err(AuthError::MalformedHeader(_))
        ));
    }
}
