mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header::AUTHORIZATION, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use jwt_verifier::{AccessToken, IdToken, JwtVerifier, VerifierConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

use support::{access_claims, now, provider_key, sign, MockProvider, KID};

async fn client_id(token: AccessToken) -> String {
    token.claims.string("cid").unwrap_or_default().to_string()
}

async fn subject(token: IdToken) -> String {
    token.claims.string("sub").unwrap_or_default().to_string()
}

fn app(provider: &MockProvider) -> Router {
    let issuer = provider.issuer();
    let config = VerifierConfig::new(issuer.clone())
        .with_expected_issuer(issuer)
        .with_client_id("myclient");
    let verifier = JwtVerifier::new(config).expect("verifier builds");

    Router::new()
        .route("/client", get(client_id))
        .route("/subject", get(subject))
        .with_state(Arc::new(verifier))
}

fn request(path: &str, authorization: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(Body::empty()).expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test(flavor = "multi_thread")]
async fn bearer_access_token_reaches_handler() {
    let provider = MockProvider::start().await;
    let _discovery = provider.serve_discovery().await;
    let _keys = provider.serve_keys().await;

    let token = sign(provider_key(), KID, &access_claims(&provider.issuer()));
    let response = app(&provider)
        .oneshot(request("/client", Some(format!("Bearer {token}"))))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&bytes[..], b"myclient");
}

#[tokio::test(flavor = "multi_thread")]
async fn bearer_id_token_reaches_handler() {
    let provider = MockProvider::start().await;
    let _discovery = provider.serve_discovery().await;
    let _keys = provider.serve_keys().await;

    let now = now();
    let claims = json!({
        "iss": provider.issuer(),
        "sub": "00u1abcd",
        "exp": now + 600,
        "iat": now,
    });
    let token = sign(provider_key(), KID, &claims);
    let response = app(&provider)
        .oneshot(request("/subject", Some(format!("Bearer {token}"))))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_header_is_unauthorized() {
    let provider = MockProvider::start().await;

    let response = app(&provider)
        .oneshot(request("/client", None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({ "code": "AUTH_EMPTY_TOKEN", "message": "authorization header missing" })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_token_is_unauthorized_with_claim_message() {
    let provider = MockProvider::start().await;
    let _discovery = provider.serve_discovery().await;
    let _keys = provider.serve_keys().await;

    let mut claims = access_claims(&provider.issuer());
    claims["exp"] = json!(now() - 1_000);
    let token = sign(provider_key(), KID, &claims);

    let response = app(&provider)
        .oneshot(request("/client", Some(format!("Bearer {token}"))))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["code"], "AUTH_TOKEN_EXPIRED");
    assert_eq!(
        body["message"],
        "the `Expiration` was not able to be validated. the token is expired"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_outage_maps_to_bad_gateway() {
    let provider = MockProvider::start().await;
    let _discovery = provider
        .server
        .mock_async(|when, then| {
            when.path(support::DISCOVERY_PATH);
            then.status(503);
        })
        .await;

    let token = sign(provider_key(), KID, &access_claims(&provider.issuer()));
    let response = app(&provider)
        .oneshot(request("/client", Some(format!("Bearer {token}"))))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["code"], "AUTH_PROVIDER_UNAVAILABLE");
}
