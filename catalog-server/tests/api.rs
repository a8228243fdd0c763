//! HTTP API tests
//!
//! Drive the full application (routes + middleware) through `oneshot`.

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use catalog_server::auth::RENEWED_TOKEN_HEADER;
use catalog_server::routes::build_app;
use catalog_server::{Config, ServerState};

struct TestApp {
    router: Router,
    _dir: Option<tempfile::TempDir>,
}

struct TestResponse {
    status: StatusCode,
    headers: http::HeaderMap,
    body: Value,
}

impl TestApp {
    async fn in_memory() -> Self {
        let config = Config::for_testing().unwrap();
        Self::with_config(config, None).await
    }

    async fn on_disk() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_testing().unwrap();
        config.database_path = dir.path().join("catalog.db").to_string_lossy().into_owned();
        Self::with_config(config, Some(dir)).await
    }

    async fn with_config(config: Config, dir: Option<tempfile::TempDir>) -> Self {
        let state = ServerState::initialize(&config).await.unwrap();
        let router = build_app(&state).with_state(state);
        Self { router, _dir: dir }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Register a user and return its token
    async fn register(&self, email: &str) -> String {
        let res = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "full_name": "Ada Lovelace", "email": email, "password": "correct horse" })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        res.body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn create_category(&self, token: &str, name: &str) -> i64 {
        let res = self
            .send("POST", "/api/categories", Some(token), Some(json!({ "name": name })))
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        res.body["data"]["id"].as_i64().unwrap()
    }

    async fn create_product(&self, token: &str, body: Value) -> TestResponse {
        self.send("POST", "/api/products", Some(token), Some(body)).await
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::in_memory().await;
    let res = app.send("GET", "/api/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["database"], "ok");
    assert!(res.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_register_and_login() {
    let app = TestApp::on_disk().await;
    app.register("ada@example.com").await;

    let res = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "success");
    assert_eq!(res.body["data"]["user"]["email"], "ada@example.com");
    assert!(res.body["data"]["user"].get("password_hash").is_none());

    let bad = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong password" })),
        )
        .await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad.body["status"], "fail");
    assert_eq!(bad.body["code"], 1002);

    let unknown = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body["code"], bad.body["code"]);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = TestApp::in_memory().await;
    app.register("ada@example.com").await;

    let dup = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "full_name": "Other", "email": "ada@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    assert_eq!(dup.body["code"], 8002);

    let short = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "full_name": "Bob", "email": "bob@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.body["details"]["field"], "password");

    let email = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "full_name": "Bob", "email": "not-an-email", "password": "password123" })),
        )
        .await;
    assert_eq!(email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::in_memory().await;

    let res = app.send("GET", "/api/products", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["status"], "fail");
    assert_eq!(res.body["code"], 1001);

    let res = app.send("GET", "/api/products", Some("garbage"), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["code"], 1004);
}

#[tokio::test]
async fn test_authenticated_response_carries_renewed_token() {
    let app = TestApp::in_memory().await;
    let token = app.register("ada@example.com").await;

    let res = app.send("GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["email"], "ada@example.com");

    let renewed = res.headers.get(RENEWED_TOKEN_HEADER).unwrap().to_str().unwrap();
    let again = app.send("GET", "/api/users/me", Some(renewed), None).await;
    assert_eq!(again.status, StatusCode::OK);

    // Public routes do not renew
    let public = app.send("GET", "/api/public/products", None, None).await;
    assert!(!public.headers.contains_key(RENEWED_TOKEN_HEADER));
}

#[tokio::test]
async fn test_product_lifecycle() {
    let app = TestApp::in_memory().await;
    let token = app.register("ada@example.com").await;
    let category = app.create_category(&token, "Lighting").await;

    let created = app
        .create_product(
            &token,
            json!({ "name": "Desk Lamp", "price": 29.5, "stock": 3, "category_id": category }),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    let product = &created.body["data"];
    let id = product["id"].as_i64().unwrap();
    assert_eq!(product["slug"], "desk-lamp");
    assert_eq!(product["category"]["name"], "Lighting");
    assert!(!product["sku"].as_str().unwrap().is_empty());

    let fetched = app
        .send("GET", &format!("/api/products/{id}"), Some(&token), None)
        .await;
    assert_eq!(fetched.body["data"]["name"], "Desk Lamp");

    let updated = app
        .send(
            "PUT",
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "name": "Reading Lamp", "price": 31.0 })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["data"]["slug"], "reading-lamp");

    let listed = app
        .send("GET", "/api/products?q=reading&page_size=10", Some(&token), None)
        .await;
    assert_eq!(listed.body["data"]["total_count"], 1);

    let deleted = app
        .send("DELETE", &format!("/api/products/{id}"), Some(&token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let missing = app
        .send("GET", &format!("/api/products/{id}"), Some(&token), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["code"], 6001);
}

#[tokio::test]
async fn test_duplicate_product_is_rejected_with_conflict() {
    let app = TestApp::in_memory().await;
    let token = app.register("ada@example.com").await;
    let category = app.create_category(&token, "Tools").await;

    let first = app
        .create_product(&token, json!({ "name": "Widget", "price": 5.0, "category_id": category }))
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .create_product(&token, json!({ "name": "  WIDGET ", "price": 6.0, "category_id": category }))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["status"], "fail");
    assert_eq!(second.body["code"], 6004);
    assert_eq!(second.body["details"]["existing_id"], first.body["data"]["id"]);
    assert!(second.body["details"]["suggestion"].is_object());

    let sku = first.body["data"]["sku"].as_str().unwrap().to_string();
    let same_sku = app
        .create_product(
            &token,
            json!({ "name": "Gadget", "price": 6.0, "category_id": category, "sku": sku.to_lowercase() }),
        )
        .await;
    assert_eq!(same_sku.status, StatusCode::CONFLICT);
    assert_eq!(same_sku.body["code"], 6005);
}

#[tokio::test]
async fn test_product_validation_errors() {
    let app = TestApp::in_memory().await;
    let token = app.register("ada@example.com").await;

    let missing = app
        .create_product(&token, json!({ "name": "Widget", "price": 5.0 }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["details"]["field"], "category_id");

    let unknown_category = app
        .create_product(&token, json!({ "name": "Widget", "price": 5.0, "category_id": 424242 }))
        .await;
    assert_eq!(unknown_category.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown_category.body["code"], 6101);
}

#[tokio::test]
async fn test_find_or_create_returns_existing() {
    let app = TestApp::in_memory().await;
    let token = app.register("ada@example.com").await;
    let category = app.create_category(&token, "Tools").await;
    let body = json!({ "name": "Hammer", "price": 12.0, "category_id": category });

    let first = app
        .send("POST", "/api/products/find-or-create", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(first.body["data"]["created"], true);

    let second = app
        .send("POST", "/api/products/find-or-create", Some(&token), Some(body))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["data"]["created"], false);
    assert_eq!(second.body["data"]["duplicate_prevented"], true);
    assert_eq!(
        second.body["data"]["product"]["id"],
        first.body["data"]["product"]["id"]
    );
}

#[tokio::test]
async fn test_duplicate_report_is_empty_for_clean_catalog() {
    let app = TestApp::in_memory().await;
    let token = app.register("ada@example.com").await;
    let category = app.create_category(&token, "Tools").await;
    app.create_product(&token, json!({ "name": "Saw", "price": 20.0, "category_id": category }))
        .await;

    let res = app
        .send("GET", "/api/products/duplicates", Some(&token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["status"], "success");
}

#[tokio::test]
async fn test_public_catalog() {
    let app = TestApp::in_memory().await;
    let token = app.register("ada@example.com").await;
    let category = app.create_category(&token, "Garden").await;

    let rake = app
        .create_product(&token, json!({ "name": "Rake", "price": 15.0, "category_id": category }))
        .await;
    let rake_id = rake.body["data"]["id"].as_i64().unwrap();
    app.create_product(&token, json!({ "name": "Shovel", "price": 25.0, "category_id": category }))
        .await;

    let listing = app.send("GET", "/api/public/products", None, None).await;
    assert_eq!(listing.status, StatusCode::OK);
    assert_eq!(listing.body["data"]["total_count"], 2);
    assert_eq!(listing.body["data"]["duplicates_removed"], 0);

    let page = app
        .send("GET", &format!("/api/public/products/{rake_id}/rake"), None, None)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["data"]["redirect"], false);

    let stale = app
        .send("GET", &format!("/api/public/products/{rake_id}/old-name"), None, None)
        .await;
    assert_eq!(stale.body["data"]["redirect"], true);
    assert_eq!(
        stale.body["data"]["canonical_url"],
        format!("/api/public/products/{rake_id}/rake")
    );

    let related = app
        .send("GET", &format!("/api/public/products/{rake_id}/related?limit=5"), None, None)
        .await;
    assert_eq!(related.status, StatusCode::OK);
    let items = related.body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Shovel");
}

#[tokio::test]
async fn test_category_and_tag_crud() {
    let app = TestApp::in_memory().await;
    let token = app.register("ada@example.com").await;

    let category = app.create_category(&token, "Kitchen").await;
    let dup = app
        .send("POST", "/api/categories", Some(&token), Some(json!({ "name": "Kitchen" })))
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    assert_eq!(dup.body["code"], 6103);

    let tag = app
        .send("POST", "/api/tags", Some(&token), Some(json!({ "name": "eco" })))
        .await;
    let tag_id = tag.body["data"]["id"].as_i64().unwrap();

    let product = app
        .create_product(
            &token,
            json!({ "name": "Kettle", "price": 40.0, "category_id": category, "tag_ids": [tag_id] }),
        )
        .await;
    let product_id = product.body["data"]["id"].as_i64().unwrap();
    assert_eq!(product.body["data"]["tags"][0]["name"], "eco");

    let deleted = app
        .send("DELETE", &format!("/api/tags/{tag_id}"), Some(&token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    let after = app
        .send("GET", &format!("/api/products/{product_id}"), Some(&token), None)
        .await;
    assert_eq!(after.body["data"]["tags"].as_array().unwrap().len(), 0);

    let gone = app
        .send("DELETE", &format!("/api/tags/{tag_id}"), Some(&token), None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["code"], 6401);

    app.send("DELETE", &format!("/api/categories/{category}"), Some(&token), None)
        .await;
    let detached = app
        .send("GET", &format!("/api/products/{product_id}"), Some(&token), None)
        .await;
    assert!(detached.body["data"]["category_id"].is_null());
}
