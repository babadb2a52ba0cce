//! Integration tests for the Cheap Eats backend.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::{redirect, Client};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::{Config, MailConfig};
use crate::db::{init_database, Repository};
use crate::mail::{Mailer, MemoryMailTransport};
use crate::search::SearchIndex;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    outbox: Arc<MemoryMailTransport>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let index_path = temp_dir.path().join("index");

        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        let search = Arc::new(SearchIndex::open(&index_path).expect("Failed to init search"));

        let config = Config {
            api_psk: psk.clone(),
            db_path,
            index_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            template_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates")),
            public_url: "http://cheapeats.test".to_string(),
            mail: MailConfig {
                host: None,
                port: 2525,
                user: None,
                password: None,
                from: "Cheap Eats! <noreply@cheapeats.dev>".to_string(),
                starttls: false,
            },
        };

        let outbox = Arc::new(MemoryMailTransport::default());
        let mailer = Mailer::new(&config.template_dir, config.mail.from.clone(), outbox.clone())
            .expect("Failed to load templates");

        let state = AppState {
            repo,
            search,
            mailer: Arc::new(mailer),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        // Redirects are asserted on, never followed
        let mut client_builder = Client::builder().redirect(redirect::Policy::none());
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            outbox,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register an account and return `(user_id, session_token)`.
    async fn register(&self, name: &str, email: &str) -> (String, String) {
        let resp = self
            .client
            .post(self.url("/api/account/register"))
            .json(&json!({
                "name": name,
                "email": email,
                "password": "hunter22",
                "passwordConfirm": "hunter22"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        (
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    async fn create_restaurant(&self, token: &str, body: Value) -> Value {
        let resp = self
            .client
            .post(self.url("/api/restaurants"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    async fn review(&self, token: &str, restaurant_id: &str, text: &str, rating: i64) {
        let resp = self
            .client
            .post(self.url(&format!("/api/reviews/{}", restaurant_id)))
            .bearer_auth(token)
            .json(&json!({ "text": text, "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);
    }

    async fn flashes(&self, token: &str) -> Vec<String> {
        let resp = self
            .client
            .get(self.url("/api/account/flashes"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["message"].as_str().unwrap().to_string())
            .collect()
    }
}

fn restaurant_body(name: &str, tags: &[&str]) -> Value {
    json!({
        "name": name,
        "description": format!("{} serves cheap food", name),
        "tags": tags,
        "location": {
            "type": "Point",
            "coordinates": [-73.9857, 40.7484],
            "address": "350 5th Ave, New York"
        }
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Plain client without the default API key header
    let resp = Client::new()
        .get(fixture.url("/api/restaurants"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/restaurants"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_psk_disabled_allows_requests() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = Client::new()
        .get(fixture.url("/api/tags"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_register_login_logout() {
    let fixture = TestFixture::new().await;
    let (user_id, token) = fixture.register("Wes", "Wes@Example.com ").await;
    assert!(!token.is_empty());

    // Email is normalized before lookup
    let resp = fixture
        .client
        .post(fixture.url("/api/account/login"))
        .json(&json!({ "email": "wes@example.com", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["user"]["id"], user_id.as_str());
    let login_token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(
        fixture.flashes(&login_token).await,
        vec!["You are now logged in!".to_string()]
    );

    // Wrong password
    let resp = fixture
        .client
        .post(fixture.url("/api/account/login"))
        .json(&json!({ "email": "wes@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Duplicate registration
    let resp = fixture
        .client
        .post(fixture.url("/api/account/register"))
        .json(&json!({
            "name": "Other",
            "email": "wes@example.com",
            "password": "pw",
            "passwordConfirm": "pw"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Logout ends the session
    let resp = fixture
        .client
        .post(fixture.url("/api/account/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/account/flashes"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_restaurant_create_and_slug_dedup() {
    let fixture = TestFixture::new().await;
    let (user_id, token) = fixture.register("Wes", "wes@example.com").await;

    let first = fixture
        .create_restaurant(&token, restaurant_body("Joe's Pizza", &["Family Friendly"]))
        .await;
    assert_eq!(first["slug"], "joes-pizza");
    assert_eq!(first["author"], user_id.as_str());
    assert_eq!(first["location"]["type"], "Point");
    assert!(first["reviews"].as_array().unwrap().is_empty());

    let second = fixture
        .create_restaurant(&token, restaurant_body("Joes Pizza", &[]))
        .await;
    assert_eq!(second["slug"], "joes-pizza-2");

    let third = fixture
        .create_restaurant(&token, restaurant_body("JOE'S PIZZA", &[]))
        .await;
    assert_eq!(third["slug"], "joes-pizza-3");

    // Lookup by id and slug
    let resp = fixture
        .client
        .get(fixture.url("/api/restaurants/slug/joes-pizza-2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], second["id"]);

    let resp = fixture
        .client
        .get(fixture.url(&format!(
            "/api/restaurants/{}",
            first["id"].as_str().unwrap()
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Joe's Pizza");

    let flashes = fixture.flashes(&token).await;
    assert_eq!(flashes.len(), 3);
    assert_eq!(
        flashes[0],
        "Successfully created Joe's Pizza. Care to leave a review?"
    );

    // Paged listing
    let resp = fixture
        .client
        .get(fixture.url("/api/restaurants?page=1"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["count"], 3);
    assert_eq!(body["data"]["pages"], 1);
    assert_eq!(body["data"]["restaurants"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_restaurant_requires_session() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/restaurants"))
        .json(&restaurant_body("Nobody's Diner", &[]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_update_restaurant_owner_only() {
    let fixture = TestFixture::new().await;
    let (_, owner) = fixture.register("Owner", "owner@example.com").await;
    let (_, other) = fixture.register("Other", "other@example.com").await;

    let restaurant = fixture
        .create_restaurant(&owner, restaurant_body("Taco Stand", &["Vegetarian"]))
        .await;
    let path = format!("/api/restaurants/{}", restaurant["id"].as_str().unwrap());

    let resp = fixture
        .client
        .put(fixture.url(&path))
        .bearer_auth(&other)
        .json(&json!({ "name": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .client
        .put(fixture.url(&path))
        .bearer_auth(&owner)
        .json(&json!({ "name": "Taco Palace" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Taco Palace");
    assert_eq!(body["data"]["slug"], "taco-palace");
    assert_eq!(body["data"]["tags"], json!(["Vegetarian"]));
}

#[tokio::test]
async fn test_review_overrides_identity_and_redirects() {
    let fixture = TestFixture::new().await;
    let (owner_id, owner) = fixture.register("Owner", "owner@example.com").await;
    let (reviewer_id, reviewer) = fixture.register("Reviewer", "reviewer@example.com").await;

    let target = fixture
        .create_restaurant(&owner, restaurant_body("Noodle Bar", &[]))
        .await;
    let decoy = fixture
        .create_restaurant(&owner, restaurant_body("Decoy Deli", &[]))
        .await;
    let target_id = target["id"].as_str().unwrap();

    // Body claims another author and restaurant; both are ignored
    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/reviews/{}", target_id)))
        .bearer_auth(&reviewer)
        .header("referer", "/restaurant/noodle-bar")
        .json(&json!({
            "text": "Great broth",
            "rating": 5,
            "author": owner_id,
            "restaurant": decoy["id"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "/restaurant/noodle-bar"
    );

    assert_eq!(
        fixture.flashes(&reviewer).await,
        vec!["Thanks! Review added!".to_string()]
    );

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/restaurants/{}", target_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let reviews = body["data"]["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["author"], reviewer_id.as_str());
    assert_eq!(reviews[0]["restaurant"], target_id);
    assert_eq!(reviews[0]["authorName"], "Reviewer");

    let resp = fixture
        .client
        .get(fixture.url(&format!(
            "/api/restaurants/{}",
            decoy["id"].as_str().unwrap()
        )))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["reviews"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_review_validation_and_missing_restaurant() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture.register("Wes", "wes@example.com").await;
    let restaurant = fixture
        .create_restaurant(&token, restaurant_body("Soup Spot", &[]))
        .await;

    // No referer falls back to the root
    let resp = fixture
        .client
        .post(fixture.url(&format!(
            "/api/reviews/{}",
            restaurant["id"].as_str().unwrap()
        )))
        .bearer_auth(&token)
        .json(&json!({ "text": "Fine" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers().get("location").unwrap(), "/");

    let resp = fixture
        .client
        .post(fixture.url(&format!(
            "/api/reviews/{}",
            restaurant["id"].as_str().unwrap()
        )))
        .bearer_auth(&token)
        .json(&json!({ "text": "   ", "rating": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .client
        .post(fixture.url("/api/reviews/missing-restaurant"))
        .bearer_auth(&token)
        .json(&json!({ "text": "Ghost food", "rating": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_top_list() {
    let fixture = TestFixture::new().await;
    let (_, alice) = fixture.register("Alice", "alice@example.com").await;
    let (_, bob) = fixture.register("Bob", "bob@example.com").await;

    let good = fixture
        .create_restaurant(&alice, restaurant_body("Good Eats", &[]))
        .await;
    let okay = fixture
        .create_restaurant(&alice, restaurant_body("Okay Eats", &[]))
        .await;
    let lonely = fixture
        .create_restaurant(&alice, restaurant_body("Lonely Eats", &[]))
        .await;

    let good_id = good["id"].as_str().unwrap();
    let okay_id = okay["id"].as_str().unwrap();
    fixture.review(&alice, good_id, "Great", 5).await;
    fixture.review(&bob, good_id, "Very good", 4).await;
    fixture.review(&alice, okay_id, "Meh", 3).await;
    fixture.review(&bob, okay_id, "Alright", 3).await;
    fixture
        .review(&bob, lonely["id"].as_str().unwrap(), "Perfect", 5)
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/top"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let top = body["data"].as_array().unwrap();

    // One review is not enough to rank
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["id"], good_id);
    assert_eq!(top[0]["averageRating"], 4.5);
    assert_eq!(top[0]["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(top[1]["id"], okay_id);
}

#[tokio::test]
async fn test_tags_list_and_filter() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture.register("Wes", "wes@example.com").await;

    fixture
        .create_restaurant(&token, restaurant_body("One", &["Wifi", "Vegan"]))
        .await;
    fixture
        .create_restaurant(&token, restaurant_body("Two", &["Wifi"]))
        .await;
    fixture
        .create_restaurant(&token, restaurant_body("Three", &[]))
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/tags"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"],
        json!([
            { "tag": "Wifi", "count": 2 },
            { "tag": "Vegan", "count": 1 }
        ])
    );

    let resp = fixture
        .client
        .get(fixture.url("/api/tags/Vegan"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["tag"], "Vegan");
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 2);
    let restaurants = body["data"]["restaurants"].as_array().unwrap();
    assert_eq!(restaurants.len(), 1);
    assert_eq!(restaurants[0]["name"], "One");
}

#[tokio::test]
async fn test_near_endpoint() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture.register("Wes", "wes@example.com").await;
    fixture
        .create_restaurant(&token, restaurant_body("Midtown Diner", &[]))
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/restaurants/near?lat=40.75&lng=-73.98"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let near = body["data"].as_array().unwrap();
    assert_eq!(near.len(), 1);
    assert!(near[0]["distanceMeters"].as_f64().unwrap() < 1_000.0);

    let resp = fixture
        .client
        .get(fixture.url("/api/restaurants/near?lat=51.5&lng=-0.12"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    let resp = fixture
        .client
        .get(fixture.url("/api/restaurants/near?lat=123&lng=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_search_endpoint() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture.register("Wes", "wes@example.com").await;

    fixture
        .create_restaurant(&token, restaurant_body("Ramen House", &["Noodles"]))
        .await;
    fixture
        .create_restaurant(&token, restaurant_body("Burger Barn", &[]))
        .await;

    // Give the index reader time to pick up the commit
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let resp = fixture
        .client
        .get(fixture.url("/api/search?q=ramen"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let results = body["data"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["restaurant"]["name"], "Ramen House");

    let resp = fixture
        .client
        .get(fixture.url("/api/search?q="))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let fixture = TestFixture::new().await;
    let (user_id, _) = fixture.register("Wes", "wes@example.com").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/account/forgot"))
        .json(&json!({ "email": "nobody@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert!(fixture.outbox.sent().await.is_empty());

    let resp = fixture
        .client
        .post(fixture.url("/api/account/forgot"))
        .json(&json!({ "email": "wes@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let sent = fixture.outbox.sent().await;
    assert_eq!(sent.len(), 1);
    let mail = &sent[0];
    assert_eq!(mail.to, "wes@example.com");
    assert_eq!(mail.subject, "Password Reset");
    assert!(mail.html.contains("style="));
    assert!(mail.text.contains("Reset my password"));
    assert!(!mail.text.contains('<'));

    let marker = "http://cheapeats.test/account/reset/";
    let start = mail.html.find(marker).expect("reset link in mail") + marker.len();
    let token: String = mail.html[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    assert!(!token.is_empty());

    // Mismatched confirmation is rejected and keeps the token valid
    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/account/reset/{}", token)))
        .json(&json!({ "password": "newpass", "passwordConfirm": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/account/reset/{}", token)))
        .json(&json!({ "password": "newpass", "passwordConfirm": "newpass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["user"]["id"], user_id.as_str());

    // Token is single use
    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/account/reset/{}", token)))
        .json(&json!({ "password": "again", "passwordConfirm": "again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .post(fixture.url("/api/account/login"))
        .json(&json!({ "email": "wes@example.com", "password": "newpass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;
    let (_, token) = fixture.register("Wes", "wes@example.com").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/restaurants"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "   ",
            "location": { "coordinates": [0.0, 0.0], "address": "Somewhere" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .client
        .post(fixture.url("/api/restaurants"))
        .bearer_auth(&token)
        .json(&json!({ "name": "No Address", "location": { "coordinates": [0.0, 0.0] } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "We need an address!");

    let resp = fixture
        .client
        .post(fixture.url("/api/account/register"))
        .json(&json!({
            "name": "Mismatch",
            "email": "mismatch@example.com",
            "password": "a",
            "passwordConfirm": "b"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/restaurants/nonexistent-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp = fixture
        .client
        .get(fixture.url("/api/restaurants/slug/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
