use std::sync::Arc;

use bookshelf_api::app::{AppState, build_app};
use bookshelf_auth::{Hs256TokenVerifier, JwtClaims, UserRecord};
use bookshelf_core::{BookId, UserId};
use bookshelf_infra::{InMemoryBookStore, InMemoryUserStore, UserStore};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    users: Arc<InMemoryUserStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        bookshelf_observability::tracing::init_for_tests();

        // Same router as prod, with in-memory stores, bound to an ephemeral port.
        let users = Arc::new(InMemoryUserStore::new());
        let state = AppState::new(
            Arc::new(InMemoryBookStore::new()),
            users.clone(),
            Arc::new(Hs256TokenVerifier::new(JWT_SECRET)),
        );
        let app = build_app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            users,
            handle,
        }
    }

    async fn register(&self, name: &str) -> UserId {
        let id = UserId::new();
        self.users
            .insert(UserRecord {
                id,
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "not-a-real-hash".to_string(),
                created_at: Utc::now(),
            })
            .await
            .expect("failed to seed user");
        id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, sub: UserId, ttl: ChronoDuration) -> String {
    let now = Utc::now();
    encode_claims(secret, &JwtClaims::new(sub, now, now + ttl))
}

fn encode_claims(secret: &str, claims: &JwtClaims) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn token_for(sub: UserId) -> String {
    mint_jwt(JWT_SECRET, sub, ChronoDuration::minutes(10))
}

fn dune() -> Value {
    json!({
        "title": "Dune",
        "author": "Frank Herbert",
        "genre": "Science Fiction",
        "price": 9.99,
    })
}

async fn create_book(client: &reqwest::Client, srv: &TestServer, token: &str, body: Value) -> Value {
    let res = client
        .post(srv.url("/api/books"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn list_books(client: &reqwest::Client, srv: &TestServer) -> Vec<Value> {
    let res = client.get(srv.url("/api/books")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

async fn message(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["message"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn root_and_health_are_public() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "API is running...");

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_requires_a_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/books"))
        .json(&dune())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Not authorized, no token");
    assert!(list_books(&client, &srv).await.is_empty());
}

#[tokio::test]
async fn create_sets_owner_from_token_and_defaults_in_stock() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;
    let mallory = UserId::new();

    let mut body = dune();
    body["owner"] = json!(mallory.to_string());
    let created = create_book(&client, &srv, &token_for(alice), body).await;

    assert_eq!(created["owner"], alice.to_string());
    assert_eq!(created["inStock"], true);
    assert_eq!(created["title"], "Dune");
    assert!(created["id"].as_str().is_some());
}

#[tokio::test]
async fn create_without_price_is_rejected_and_writes_nothing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;

    let res = client
        .post(srv.url("/api/books"))
        .bearer_auth(token_for(alice))
        .json(&json!({ "title": "X", "author": "Y", "genre": "Z" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(res).await, "Please add all required fields");
    assert!(list_books(&client, &srv).await.is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;

    let res = client
        .post(srv.url("/api/books"))
        .bearer_auth(token_for(alice))
        .header("content-type", "application/json")
        .body("{\"title\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_and_get_are_public() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;
    let created = create_book(&client, &srv, &token_for(alice), dune()).await;
    let id = created["id"].as_str().unwrap();

    let all = list_books(&client, &srv).await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["id"], id);

    let res = client.get(srv.url(&format!("/api/books/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_unknown_book_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for id in [BookId::new().to_string(), "not-an-id".to_string()] {
        let res = client.get(srv.url(&format!("/api/books/{id}"))).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(message(res).await, "Book not found");
    }
}

#[tokio::test]
async fn owner_can_partially_update() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;
    let token = token_for(alice);
    let created = create_book(&client, &srv, &token, dune()).await;
    let url = srv.url(&format!("/api/books/{}", created["id"].as_str().unwrap()));

    let res = client
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({ "title": "Dune Messiah" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();

    assert_eq!(updated["title"], "Dune Messiah");
    for field in ["id", "owner", "author", "genre", "price", "inStock"] {
        assert_eq!(updated[field], created[field], "{field} changed");
    }
}

#[tokio::test]
async fn repeating_an_update_is_idempotent() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;
    let token = token_for(alice);
    let created = create_book(&client, &srv, &token, dune()).await;
    let url = srv.url(&format!("/api/books/{}", created["id"].as_str().unwrap()));
    let patch = json!({ "price": 0, "inStock": false, "genre": "Classic" });

    let mut states = Vec::new();
    for _ in 0..2 {
        let res = client.put(&url).bearer_auth(&token).json(&patch).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        states.push(res.json::<Value>().await.unwrap());
    }

    assert_eq!(states[0], states[1]);
    assert_eq!(states[0]["price"], 0.0);
    assert_eq!(states[0]["inStock"], false);
}

#[tokio::test]
async fn non_owner_cannot_update_or_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;
    let bob = srv.register("Bob").await;
    let created = create_book(&client, &srv, &token_for(alice), dune()).await;
    let url = srv.url(&format!("/api/books/{}", created["id"].as_str().unwrap()));

    let res = client
        .put(&url)
        .bearer_auth(token_for(bob))
        .json(&json!({ "title": "Stolen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Not authorized to update this book");

    let res = client.delete(&url).bearer_auth(token_for(bob)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Not authorized to delete this book");

    let fetched: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn missing_book_is_not_found_before_ownership() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let bob = srv.register("Bob").await;
    let url = srv.url(&format!("/api/books/{}", BookId::new()));

    let res = client
        .put(&url)
        .bearer_auth(token_for(bob))
        .json(&json!({ "title": "Anything" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(&url).bearer_auth(token_for(bob)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(message(res).await, "Book not found");
}

#[tokio::test]
async fn owner_can_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;
    let token = token_for(alice);
    let created = create_book(&client, &srv, &token, dune()).await;
    let url = srv.url(&format!("/api/books/{}", created["id"].as_str().unwrap()));

    let res = client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(message(res).await, "Book removed");

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_scheme_is_treated_as_no_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;
    let created = create_book(&client, &srv, &token_for(alice), dune()).await;
    let url = srv.url(&format!("/api/books/{}", created["id"].as_str().unwrap()));

    let res = client
        .delete(&url)
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Not authorized, no token");
    assert_eq!(list_books(&client, &srv).await.len(), 1);
}

#[tokio::test]
async fn bad_or_expired_tokens_fail_verification() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;

    let forged = mint_jwt("other-secret", alice, ChronoDuration::minutes(10));
    let now = Utc::now();
    let expired = encode_claims(
        JWT_SECRET,
        &JwtClaims::new(alice, now - ChronoDuration::hours(2), now - ChronoDuration::hours(1)),
    );

    for token in [forged, expired] {
        let res = client
            .post(srv.url("/api/books"))
            .bearer_auth(&token)
            .json(&dune())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(message(res).await, "Not authorized, token failed");
    }
}

#[tokio::test]
async fn token_for_unknown_user_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/books"))
        .bearer_auth(token_for(UserId::new()))
        .json(&dune())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res).await, "Not authorized, user not found");
}

#[tokio::test]
async fn update_and_delete_without_valid_token_leave_book_untouched() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;
    let created = create_book(&client, &srv, &token_for(alice), dune()).await;
    let url = srv.url(&format!("/api/books/{}", created["id"].as_str().unwrap()));
    let forged = mint_jwt("other-secret", alice, ChronoDuration::minutes(10));

    let cases: [(Option<&str>, &str); 2] = [
        (None, "Not authorized, no token"),
        (Some(forged.as_str()), "Not authorized, token failed"),
    ];

    for (token, expected) in cases {
        let mut put = client.put(&url).json(&json!({ "title": "Hijacked", "price": 0 }));
        let mut delete = client.delete(&url);
        if let Some(token) = token {
            put = put.bearer_auth(token);
            delete = delete.bearer_auth(token);
        }

        let res = put.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(message(res).await, expected);

        let res = delete.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(message(res).await, expected);

        let fetched: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
        assert_eq!(fetched, created);
    }
}

#[tokio::test]
async fn token_from_issuer_with_fast_clock_is_accepted() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.register("Alice").await;

    let issued = Utc::now() + ChronoDuration::seconds(5);
    let token = encode_claims(
        JWT_SECRET,
        &JwtClaims::new(alice, issued, issued + ChronoDuration::minutes(10)),
    );

    create_book(&client, &srv, &token, dune()).await;
    assert_eq!(list_books(&client, &srv).await.len(), 1);
}
