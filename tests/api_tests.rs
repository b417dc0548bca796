use parky_api::{
    AppState, KeysState, TokenIssuer, TokenKeys, create_router,
    models::{NationalPark, Trail, User},
    repository::{InMemoryRepository, InMemoryUserStore},
};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

const TEST_JWT_SECRET: &str = "api-test-secret";

pub struct TestApp {
    pub address: String,
    pub keys: KeysState,
}

/// Serves the full router over in-memory stores on an ephemeral port.
async fn spawn_app() -> TestApp {
    let keys = Arc::new(TokenKeys::from_secret(TEST_JWT_SECRET).unwrap());

    let state = AppState::new(
        Arc::new(InMemoryRepository::<NationalPark>::new()),
        Arc::new(InMemoryRepository::<Trail>::new()),
        Arc::new(InMemoryUserStore::new()),
        keys.clone(),
    );
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, keys }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers and authenticates, returning the issued token.
    async fn login(&self, client: &reqwest::Client, username: &str, password: &str) -> String {
        let credentials = json!({ "username": username, "password": password });

        let res = client
            .post(self.url("/api/users/register"))
            .json(&credentials)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = client
            .post(self.url("/api/users/authenticate"))
            .json(&credentials)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let user: Value = res.json().await.unwrap();
        user["token"].as_str().unwrap().to_string()
    }

    fn token_for_role(&self, role: &str) -> String {
        let user = User {
            id: 500,
            username: "visitor".to_string(),
            role: role.to_string(),
            ..User::default()
        };
        TokenIssuer::new(self.keys.clone()).issue(&user).unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(app.url("/health"))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    // Every response carries a request id.
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_account_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let credentials = json!({ "username": "ranger1", "password": "pass123" });

    // 1. Register
    let res = client
        .post(app.url("/api/users/register"))
        .json(&credentials)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // 2. Register again with the same username
    let res = client
        .post(app.url("/api/users/register"))
        .json(&credentials)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Username already exists");

    // 3. Authenticate
    let res = client
        .post(app.url("/api/users/authenticate"))
        .json(&credentials)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let user: Value = res.json().await.unwrap();
    assert_eq!(user["username"], "ranger1");
    assert_eq!(user["role"], "Admin");
    assert!(user["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(user.get("password").is_none(), "password must never be serialized");

    // 4. Wrong password
    let res = client
        .post(app.url("/api/users/authenticate"))
        .json(&json!({ "username": "ranger1", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Username or password is incorrect.");
}

#[tokio::test]
async fn test_national_park_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = app.login(&client, "ranger1", "pass123").await;
    let park = json!({
        "name": "Yellowstone",
        "state": "Wyoming",
        "established": "1872-03-01T00:00:00Z"
    });

    // 1. Create
    let res = client
        .post(app.url("/api/nationalparks"))
        .bearer_auth(&token)
        .json(&park)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    let created: NationalPark = res.json().await.unwrap();
    assert_eq!(location, format!("/api/nationalparks/{}", created.id));

    // 2. Duplicate name
    let res = client
        .post(app.url("/api/nationalparks"))
        .bearer_auth(&token)
        .json(&park)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // 3. Public listing
    let parks: Vec<NationalPark> = client
        .get(app.url("/api/nationalparks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(parks.len(), 1);

    // 4. Get by id
    let res = client
        .get(app.url(&location))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: NationalPark = res.json().await.unwrap();
    assert_eq!(fetched.name, "Yellowstone");

    // 5. Update
    let mut changed = fetched.clone();
    changed.state = "Montana".to_string();
    let res = client
        .patch(app.url(&location))
        .bearer_auth(&token)
        .json(&changed)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // 6. Delete
    let res = client
        .delete(app.url(&location))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // 7. Gone
    let res = client
        .get(app.url(&location))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trail_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = app.login(&client, "ranger1", "pass123").await;

    let park: NationalPark = client
        .post(app.url("/api/nationalparks"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Yosemite", "state": "California" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let res = client
        .post(app.url("/api/trails"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Mist Trail",
            "distance": 4.8,
            "elevation": 305.0,
            "difficulty": "Difficult",
            "national_park_id": park.id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let trail: Value = res.json().await.unwrap();
    assert_eq!(trail["difficulty"], "Difficult");

    let in_park: Vec<Trail> = client
        .get(app.url(&format!("/api/trails/in-park/{}", park.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(in_park.len(), 1);
    assert_eq!(in_park[0].name, "Mist Trail");

    let res = client
        .get(app.url(&format!("/api/trails/{}", trail["id"])))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let res = client
        .post(app.url("/api/nationalparks"))
        .json(&json!({ "name": "Yellowstone", "state": "Wyoming" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(app.url("/api/nationalparks/1"))
        .bearer_auth("not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .delete(app.url("/api/trails/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unprivileged_role_is_forbidden() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let visitor = app.token_for_role("Visitor");

    let res = client
        .post(app.url("/api/nationalparks"))
        .bearer_auth(&visitor)
        .json(&json!({ "name": "Yellowstone", "state": "Wyoming" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(app.url("/api/trails/1"))
        .bearer_auth(&visitor)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Authenticated-tier reads accept any role; the park simply does not exist.
    let res = client
        .get(app.url("/api/nationalparks/1"))
        .bearer_auth(&visitor)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_is_checked_before_the_body_is_read() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let visitor = app.token_for_role("Visitor");

    // Malformed JSON
    let res = client
        .post(app.url("/api/nationalparks"))
        .bearer_auth(&visitor)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Well-formed JSON missing required fields
    let res = client
        .patch(app.url("/api/trails/1"))
        .bearer_auth(&visitor)
        .json(&json!({ "name": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "forbidden");

    // Non-numeric path id
    let res = client
        .delete(app.url("/api/nationalparks/abc"))
        .bearer_auth(&visitor)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rejected_input_uses_error_body() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = app.login(&client, "ranger1", "pass123").await;

    let res = client
        .post(app.url("/api/nationalparks"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));

    let res = client
        .patch(app.url("/api/trails/1"))
        .bearer_auth(&token)
        .json(&json!({ "name": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].is_string());

    let res = client
        .get(app.url("/api/nationalparks/abc"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].is_string());

    let res = client
        .post(app.url("/api/users/authenticate"))
        .body("username=ranger1")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].is_string());
}
