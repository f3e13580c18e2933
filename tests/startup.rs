#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Startup with an unreachable key endpoint: the process keeps going and requests that
//! need keys answer 503 instead of a deny.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use api_authorizer::app::{build_router, build_state};
use api_authorizer::config::Config;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

const PRIVATE_KEY_PEM: &str = include_str!("fixtures/rsa_private_key.pem");
const ARN: &str = "arn:aws:execute-api:us-east-1:123456789012:abc123/prod/GET/items";

fn config(vars: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

fn unreachable_keys_config() -> Config {
    config(&[
        ("COGNITO_USER_POOL_ID", "us-east-1_TestPool"),
        ("COGNITO_APP_CLIENT_IDS", "login-client"),
        // Discard port; nothing listens there.
        ("COGNITO_JWKS_URI", "http://127.0.0.1:9/jwks.json"),
        ("JWKS_FETCH_TIMEOUT_MS", "300"),
        ("JWKS_REFRESH_COOLDOWN_SECONDS", "60"),
        ("REQUEST_TIMEOUT_MS", "2000"),
    ])
}

fn signed_token() -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 3600;
    let claims = json!({
        "iss": "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_TestPool",
        "sub": "u-42",
        "client_id": "login-client",
        "token_use": "access",
        "exp": exp,
    });

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("test-key-1".to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, &claims, &key).unwrap()
}

async fn post_event(app: axum::Router, event: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/authorize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(event.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn failed_key_prefetch_does_not_stop_startup() {
    let config = unreachable_keys_config();

    let state = build_state(&config).await.unwrap();
    let app = build_router(state, config.request_timeout);

    let health = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let (status, body) = post_event(
        app.clone(),
        json!({ "authorizationToken": format!("Bearer {}", signed_token()), "methodArn": ARN }),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "AUTHORIZER_UNAVAILABLE");

    // Credential problems never touch the key set.
    let (status, body) = post_event(
        app,
        json!({ "authorizationToken": "Basic abc", "methodArn": ARN }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principalId"], "user");
}

#[tokio::test]
async fn failed_prefetch_answers_within_request_budget() {
    let config = unreachable_keys_config();
    let app = build_router(build_state(&config).await.unwrap(), config.request_timeout);

    // The failed prefetch started the cooldown; no second fetch is attempted.
    let (status, _) = tokio::time::timeout(
        Duration::from_millis(500),
        post_event(
            app,
            json!({ "authorizationToken": format!("Bearer {}", signed_token()), "methodArn": ARN }),
        ),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
