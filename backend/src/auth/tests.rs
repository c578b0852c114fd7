use super::*;
use axum::http::Request;
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";

fn sign(claims: &SupabaseClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[derive(Serialize)]
struct ClaimsWithAudience<'a> {
    #[serde(flatten)]
    claims: &'a SupabaseClaims,
    aud: &'a str,
}

fn sign_for_audience(claims: &SupabaseClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        &ClaimsWithAudience {
            claims,
            aud: "authenticated",
        },
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn claims(exp: usize) -> SupabaseClaims {
    SupabaseClaims {
        sub: "123e4567-e89b-12d3-a456-426614174000".to_string(),
        role: "authenticated".to_string(),
        email: Some("test@example.com".to_string()),
        exp,
    }
}

#[test]
fn test_validate_supabase_jwt_success() {
    let my_claims = claims(9999999999);
    let token = sign_for_audience(&my_claims, SECRET);

    let decoded = validate_supabase_jwt(&token, SECRET).expect("Valid token should pass");
    assert_eq!(decoded.sub, my_claims.sub);
    assert_eq!(decoded.email, my_claims.email);
}

#[test]
fn test_validate_supabase_jwt_expired() {
    let token = sign_for_audience(&claims(1), SECRET);
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_invalid_signature() {
    let token = sign_for_audience(&claims(9999999999), "wrongsecret");
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_requires_audience() {
    let token = sign(&claims(9999999999), SECRET);
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[tokio::test]
async fn extractor_reads_bearer_token() {
    let token = sign_for_audience(&claims(9999999999), SECRET);
    let request = Request::builder()
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .extension(SupabaseJwtSecret(Arc::from(SECRET)))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(user.user_id.to_string(), "123e4567-e89b-12d3-a456-426614174000");
    assert_eq!(user.role, "authenticated");
}

#[tokio::test]
async fn extractor_rejects_missing_header() {
    let request = Request::builder()
        .extension(SupabaseJwtSecret(Arc::from(SECRET)))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let rejection = AuthUser::from_request_parts(&mut parts, &())
        .await
        .unwrap_err();
    assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);
}
