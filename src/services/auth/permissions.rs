use super::{claims::VerifiedClaims, error::AuthError};

/// Confirms `permission` is granted by `claims`.
///
/// A token without any `permissions` claim is a different failure from one
/// whose list simply lacks the permission.
pub fn check_permissions(permission: &str, claims: &VerifiedClaims) -> Result<(), AuthError> {
    let granted = claims
        .permissions
        .as_deref()
        .ok_or(AuthError::MissingPermissionsClaim)?;

    if !granted.iter().any(|p| p == permission) {
        return Err(AuthError::PermissionDenied);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(permissions: Option<serde_json::Value>) -> VerifiedClaims {
        let mut value = json!({"iss": "i", "aud": "a", "exp": 1});
        if let Some(p) = permissions {
            value["permissions"] = p;
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn granted() {
        let c = claims(Some(json!(["get:drinks-detail", "post:drinks"])));
        assert_eq!(check_permissions("post:drinks", &c), Ok(()));
    }

    #[test]
    fn no_permissions_claim() {
        assert_eq!(
            check_permissions("post:drinks", &claims(None)),
            Err(AuthError::MissingPermissionsClaim)
        );
    }

    #[test]
    fn empty_permissions_is_a_denial() {
        assert_eq!(
            check_permissions("post:drinks", &claims(Some(json!([])))),
            Err(AuthError::PermissionDenied)
        );
    }

    #[test]
    fn match_is_exact_and_case_sensitive() {
        let c = claims(Some(json!(["post:drinks"])));
        assert_eq!(
            check_permissions("POST:drinks", &c),
            Err(AuthError::PermissionDenied)
        );
        assert_eq!(
            check_permissions("post:drink", &c),
            Err(AuthError::PermissionDenied)
        );
        assert_eq!(
            check_permissions("post:*", &claims(Some(json!(["post:*"])))),
            Ok(())
        );
        assert_eq!(
            check_permissions("post:drinks", &claims(Some(json!(["post:*"])))),
            Err(AuthError::PermissionDenied)
        );
    }
}
