use api::auth::claims::{AuthUser, Claims};
use api::auth::generate_jwt;
use axum::{extract::FromRequestParts, http::{Request, StatusCode}};
use db::models::user::Role;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::helpers::make_test_app;

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

fn sign(claims: &Claims, secret: &str) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
}

async fn extract(token: &str) -> Result<AuthUser, (StatusCode, &'static str)> {
    let request = Request::builder()
        .header("Authorization", format!("Bearer {token}"))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();
    AuthUser::from_request_parts(&mut parts, &()).await
}

#[tokio::test]
async fn valid_token_yields_claims() {
    let _ = make_test_app().await;
    let (token, _) = generate_jwt(7, Role::Teacher).unwrap();

    let AuthUser(claims) = extract(&token).await.unwrap();
    assert_eq!(claims.sub, 7);
    assert_eq!(claims.role, Role::Teacher);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let _ = make_test_app().await;
    let claims = Claims {
        sub: 1,
        exp: (now_secs() + 3600) as usize,
        role: Role::Admin,
    };

    let (status, message) = extract(&sign(&claims, "wrong_secret")).await.unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message, "Invalid or expired token");
}

#[tokio::test]
async fn missing_header_is_rejected() {
    let _ = make_test_app().await;
    let request = Request::builder().body(()).unwrap();
    let (mut parts, _) = request.into_parts();

    let (status, message) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message, "Missing or invalid Authorization header");
}
