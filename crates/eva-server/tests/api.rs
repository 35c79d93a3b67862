use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use eva_core::config::EvaConfig;
use eva_core::models::media::MediaResult;
use eva_generation::orchestrator::Orchestrator;
use eva_ledger::ledger::Ledger;
use eva_ledger::memory::MemoryStore;
use eva_providers::registry::ProviderSet;
use eva_server::error::ApiError;
use eva_server::middleware::auth::Claims;
use eva_server::routes::generate::with_deadline;
use eva_server::state::AppState;
use eva_storage::artifact::ArtifactFetcher;
use eva_storage::local::LocalStore;

const SECRET: &str = "test-secret";

struct TestApp {
    router: axum::Router,
    media: TempDir,
}

/// App with no provider credentials: every generation is accepted, charged
/// and comes back empty.
fn app_with(mutate: impl FnOnce(&mut EvaConfig)) -> TestApp {
    let media = tempfile::tempdir().expect("tempdir");
    let mut config = EvaConfig::default();
    config.server.jwt_secret = SECRET.to_string();
    config.media.root = media.path().to_path_buf();
    mutate(&mut config);
    let config = Arc::new(config);

    let ledger = Arc::new(Ledger::new(Arc::new(MemoryStore::new())));
    let providers = ProviderSet::from_config(&config).expect("providers");
    let fetcher = Arc::new(ArtifactFetcher::new(
        reqwest::Client::new(),
        Arc::new(LocalStore::from_config(&config.media)),
    ));
    let orchestrator = Arc::new(Orchestrator::new(&config, ledger, providers, fetcher));

    TestApp {
        router: eva_server::router(AppState::new(config, orchestrator)),
        media,
    }
}

fn app() -> TestApp {
    app_with(|_| {})
}

fn token_for(user_id: Uuid) -> String {
    let exp = jiff::Timestamp::now().as_second() as u64 + 3600;
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some("user@example.com".to_string()),
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
        .expect("token")
}

async fn call(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn get(path: &str, token: &str) -> Request<Body> {
    Request::get(path)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

fn post(path: &str, token: &str, body: Value) -> Request<Body> {
    Request::post(path)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        other => other.to_string().parse().expect("decimal number"),
    }
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = app();
    let request = Request::get("/health").body(Body::empty()).expect("request");
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_reject_missing_or_forged_tokens() {
    let app = app();

    let request = Request::get("/users/balance").body(Body::empty()).expect("request");
    let (status, _) = call(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = encode(
        &Header::default(),
        &Claims {
            sub: Uuid::new_v4().to_string(),
            email: None,
            exp: jiff::Timestamp::now().as_second() as u64 + 3600,
        },
        &EncodingKey::from_secret(b"other-secret"),
    )
    .expect("token");
    let (status, _) = call(&app, get("/users/balance", &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_request_opens_account_with_starting_balance() {
    let app = app();
    let token = token_for(Uuid::new_v4());

    let (status, body) = call(&app, get("/users/balance", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["balance"]), Decimal::ONE_HUNDRED);

    let txns = body["transactions"].as_array().expect("transactions");
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0]["type"], "deposit");
}

#[tokio::test]
async fn generation_is_charged_even_when_nothing_is_produced() {
    let app = app();
    let token = token_for(Uuid::new_v4());

    let (status, body) = call(
        &app,
        post("/chat/generate-image", &token, json!({ "prompt": "a red fox" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imageUrl"], "");
    assert!(body.get("originalImageUrl").is_none());

    let (status, body) = call(
        &app,
        post(
            "/chat/generate-video-from-image",
            &token,
            json!({ "imageUrl": "https://cdn.example/me.jpg", "text": "hi" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["videoUrl"], "");

    let (_, body) = call(&app, get("/users/balance", &token)).await;
    assert_eq!(decimal(&body["balance"]), Decimal::from(89));
    assert_eq!(body["transactions"].as_array().expect("transactions").len(), 3);
}

#[tokio::test]
async fn insufficient_balance_is_payment_required() {
    let app = app_with(|c| c.pricing.initial_balance = Decimal::ZERO);
    let token = token_for(Uuid::new_v4());

    let (status, body) = call(
        &app,
        post("/chat/generate-video", &token, json!({ "prompt": "waves" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().expect("error").contains("insufficient"));
}

#[tokio::test]
async fn blank_input_is_bad_request() {
    let app = app();
    let token = token_for(Uuid::new_v4());

    let (status, _) = call(
        &app,
        post("/chat/generate-image", &token, json!({ "prompt": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        post(
            "/chat/generate-video-from-image",
            &token,
            json!({ "imageUrl": "", "text": "hi" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, get("/users/balance", &token)).await;
    assert_eq!(decimal(&body["balance"]), Decimal::ONE_HUNDRED);
}

#[tokio::test]
async fn balance_cannot_be_topped_up_by_the_user() {
    let app = app();
    let token = token_for(Uuid::new_v4());

    let (status, _) = call(
        &app,
        post("/users/balance/top-up", &token, json!({ "amount": "1000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, get("/users/balance", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["balance"]), Decimal::ONE_HUNDRED);
    assert_eq!(body["transactions"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn create_girl_uses_fallback_persona_for_free() {
    let app = app();
    let token = token_for(Uuid::new_v4());

    let (status, body) = call(&app, post("/chat/create-girl", &token, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["appearance"],
        "Beautiful girl with long brown hair and blue eyes"
    );
    assert_eq!(body["personality"], "Shy, smart, affectionate");
    assert_eq!(body["avatarUrl"], "");
    assert!(!body["name"].as_str().expect("name").is_empty());
    assert!(body["firstMessage"].as_str().expect("message").starts_with("Hi there"));

    let (_, body) = call(&app, get("/users/balance", &token)).await;
    assert_eq!(decimal(&body["balance"]), Decimal::ONE_HUNDRED);
}

#[tokio::test]
async fn stored_artifacts_are_served() {
    let app = app();
    let images = app.media.path().join("images");
    std::fs::create_dir_all(&images).expect("mkdir");
    std::fs::write(images.join("1700000000000-abc.jpg"), b"jpeg").expect("write");

    let request = Request::get("/uploads/images/1700000000000-abc.jpg")
        .body(Body::empty())
        .expect("request");
    let response = app.router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&bytes[..], b"jpeg");
}

#[tokio::test(start_paused = true)]
async fn deadline_turns_into_gateway_timeout() {
    let never = std::future::pending::<Result<MediaResult, eva_generation::error::GenerationError>>();
    let err = with_deadline(Duration::from_secs(300), never).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)));
}
