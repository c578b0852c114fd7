use axum::{
    Json,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// `{ "error": "<message>" }` with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Gate for `/internal/*` routes. Rejects everything with 503 when no token is configured.
pub fn authorize_internal(headers: &HeaderMap, expected_token: Option<&str>) -> Result<(), Response> {
    let Some(expected_token) = expected_token else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "internal API token is not configured",
        ));
    };

    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(token) if token_matches(token, expected_token) => Ok(()),
        _ => Err(error_response(StatusCode::UNAUTHORIZED, "unauthorized")),
    }
}

/// Compares fixed-length MACs of both tokens so timing reveals neither content nor length.
fn token_matches(provided: &str, expected: &str) -> bool {
    let (Ok(mut provided_mac), Ok(mut expected_mac)) = (
        HmacSha256::new_from_slice(expected.as_bytes()),
        HmacSha256::new_from_slice(expected.as_bytes()),
    ) else {
        return false;
    };
    provided_mac.update(provided.as_bytes());
    expected_mac.update(expected.as_bytes());

    provided_mac
        .verify_slice(&expected_mac.finalize().into_bytes())
        .is_ok()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn unconfigured_token_is_unavailable() {
        let err = authorize_internal(&headers("Bearer x"), None).unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn checks_bearer_token() {
        assert!(authorize_internal(&headers("Bearer s3cret"), Some("s3cret")).is_ok());

        let err = authorize_internal(&headers("Bearer wrong"), Some("s3cret")).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = authorize_internal(&HeaderMap::new(), Some("s3cret")).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn token_comparison_needs_an_exact_match() {
        assert!(token_matches("s3cret", "s3cret"));
        assert!(!token_matches("s3cre", "s3cret"));
        assert!(!token_matches("s3cret-and-more", "s3cret"));
        assert!(!token_matches("S3CRET", "s3cret"));
        assert!(!token_matches("", "s3cret"));
    }
}
