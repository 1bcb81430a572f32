use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use application::memory::{
    InMemoryItemRepository, InMemoryMessageRepository, InMemoryUserRepository,
};
use application::services::{
    EngagementService, EngagementServiceDependencies, ListingService, ListingServiceDependencies,
    MessagingService, MessagingServiceDependencies, UserService, UserServiceDependencies,
};
use application::{FileStorage, PasswordHasher, PasswordHasherError, StorageError, SystemClock};
use domain::PasswordHash;
use web_api::{router, AppState, JwtConfig, JwtService};

struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, plain: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(plain.to_owned()).map_err(|err| PasswordHasherError::Hash(err.to_string()))
    }

    async fn verify(&self, plain: &str, hash: &PasswordHash) -> Result<bool, PasswordHasherError> {
        Ok(hash.as_str() == plain)
    }
}

struct DiscardingFileStorage;

#[async_trait]
impl FileStorage for DiscardingFileStorage {
    async fn store(&self, _original_name: &str, _bytes: &[u8]) -> Result<String, StorageError> {
        Ok("/uploads/image-0.jpg".to_owned())
    }
}

fn test_router() -> Router {
    let user_repository = Arc::new(InMemoryUserRepository::default());
    let item_repository = Arc::new(InMemoryItemRepository::default());
    let message_repository = Arc::new(InMemoryMessageRepository::default());
    let clock = Arc::new(SystemClock);
    let password_hasher = Arc::new(PlainPasswordHasher);

    let user_service = Arc::new(UserService::new(
        UserServiceDependencies {
            user_repository: user_repository.clone(),
            password_hasher,
            clock: clock.clone(),
        },
        "deakin.edu.au",
    ));
    let listing_service = Arc::new(ListingService::new(ListingServiceDependencies {
        item_repository: item_repository.clone(),
        user_repository: user_repository.clone(),
        clock: clock.clone(),
    }));
    let engagement_service = Arc::new(EngagementService::new(EngagementServiceDependencies {
        item_repository: item_repository.clone(),
        user_repository: user_repository.clone(),
        clock: clock.clone(),
    }));
    let messaging_service = Arc::new(MessagingService::new(MessagingServiceDependencies {
        message_repository,
        item_repository,
        user_repository,
        clock,
    }));

    let jwt_service = Arc::new(JwtService::new(JwtConfig {
        secret: "integration-test-secret-with-32-chars!!".to_string(),
        expiration_hours: 24,
    }));

    let state = AppState {
        user_service,
        listing_service,
        engagement_service,
        messaging_service,
        file_storage: Arc::new(DiscardingFileStorage),
        jwt_service,
        uploads_dir: "uploads".to_string(),
    };
    router(state)
}

async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn register_and_login(app: &Router, name: &str) -> (Uuid, String) {
    let (status, body) = send_request(
        app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({
                "email": format!("{name}@deakin.edu.au"),
                "password": "secret",
                "name": name,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["id"].as_str().unwrap().parse::<Uuid>().unwrap();

    let (status, body) = send_request(
        app,
        json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({
                "email": format!("{name}@deakin.edu.au"),
                "password": "secret",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_owned();

    (user_id, token)
}

async fn create_item(app: &Router, token: &str, title: &str) -> Uuid {
    let (status, body) = send_request(
        app,
        json_request(
            "POST",
            "/api/v1/items",
            Some(token),
            json!({
                "title": title,
                "description": "barely used",
                "price": 40.0,
                "category": "textbooks",
                "condition": "good",
                "location": "Burwood campus",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse::<Uuid>().unwrap()
}

#[tokio::test]
async fn user_directory_is_public() {
    let app = test_router();
    let (user_id, _) = register_and_login(&app, "alice").await;

    // 无令牌即可浏览用户列表与单个用户
    let (status, body) = send_request(
        &app,
        Request::builder()
            .uri("/api/v1/users")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "alice");
    assert!(users[0].get("password").is_none());

    let (status, body) = send_request(
        &app,
        Request::builder()
            .uri(format!("/api/v1/users/{user_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "alice");
}

#[tokio::test]
async fn status_all_lists_items_in_every_state() {
    let app = test_router();
    let (_, token) = register_and_login(&app, "bob").await;

    let first = create_item(&app, &token, "Calculus textbook").await;
    create_item(&app, &token, "Desk lamp").await;

    let (status, _) = send_request(
        &app,
        json_request(
            "PATCH",
            &format!("/api/v1/items/{first}/status"),
            Some(&token),
            json!({ "status": "Pending" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_request(
        &app,
        Request::builder()
            .uri("/api/v1/items?status=all")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send_request(
        &app,
        Request::builder()
            .uri("/api/v1/items?status=Pending")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let pending = body.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["title"], "Calculus textbook");
}
