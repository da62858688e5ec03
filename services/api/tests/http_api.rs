//! End-to-end HTTP tests
//!
//! These tests run against a real Postgres database and are ignored by
//! default. Point `DATABASE_URL` at a migrated database and run with
//! `--ignored` to exercise them.

use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::{Value, json};

use api::{routes::create_router, state::AppState};
use common::database::{DatabaseConfig, init_pool};

static EMAIL_COUNTER: AtomicU32 = AtomicU32::new(0);

fn unique_email(prefix: &str) -> String {
    let n = EMAIL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{n}@example.com", uuid::Uuid::new_v4().simple())
}

/// Boot the app on an ephemeral port and return its base URL
async fn spawn_app() -> String {
    let db_config = DatabaseConfig::from_env().expect("database config");
    let pool = init_pool(&db_config).await.expect("database pool");

    let media_root = std::env::temp_dir().join(format!("recipebook-test-{}", uuid::Uuid::new_v4()));
    let state = AppState::new(pool, media_root);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });

    format!("http://{addr}")
}

/// Register a user and exchange their credentials for a token
async fn register_and_token(client: &reqwest::Client, base: &str, email: &str) -> String {
    let response = client
        .post(format!("{base}/users"))
        .json(&json!({"email": email, "password": "pass123", "name": "Test User"}))
        .send()
        .await
        .expect("register request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{base}/users/token"))
        .json(&json!({"email": email, "password": "pass123"}))
        .send()
        .await
        .expect("token request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("token body");
    body["token"].as_str().expect("token field").to_string()
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn register_returns_user_without_password() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("register");

    let response = client
        .post(format!("{base}/users"))
        .json(&json!({"email": email, "password": "pass123", "name": "Test User"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["name"], "Test User");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    // Same email again is rejected
    let response = client
        .post(format!("{base}/users"))
        .json(&json!({"email": email, "password": "pass123", "name": "Other"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn short_password_is_rejected_and_not_persisted() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("shortpw");

    let response = client
        .post(format!("{base}/users"))
        .json(&json!({"email": email, "password": "pw", "name": "Test User"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Registration with the same email still works afterwards
    let response = client
        .post(format!("{base}/users"))
        .json(&json!({"email": email, "password": "pass123", "name": "Test User"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn token_requires_valid_credentials() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("token");

    client
        .post(format!("{base}/users"))
        .json(&json!({"email": email, "password": "pass123", "name": "Test User"}))
        .send()
        .await
        .unwrap();

    // Wrong password
    let response = client
        .post(format!("{base}/users/token"))
        .json(&json!({"email": email, "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Unknown email
    let response = client
        .post(format!("{base}/users/token"))
        .json(&json!({"email": unique_email("nobody"), "password": "pass123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Missing password
    let response = client
        .post(format!("{base}/users/token"))
        .json(&json!({"email": email}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Correct credentials
    let response = client
        .post(format!("{base}/users/token"))
        .json(&json!({"email": email, "password": "pass123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn protected_routes_require_a_token() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/users/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .get(format!("{base}/recipes"))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn profile_can_be_read_and_updated() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("profile");
    let token = register_and_token(&client, &base, &email).await;

    let response = client
        .get(format!("{base}/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["name"], "Test User");

    // POST is not part of the profile surface
    let response = client
        .post(format!("{base}/users/me"))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);

    let response = client
        .patch(format!("{base}/users/me"))
        .bearer_auth(&token)
        .json(&json!({"name": "Updated Name", "password": "newpass123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Updated Name");

    // The new password authenticates
    let response = client
        .post(format!("{base}/users/token"))
        .json(&json!({"email": email, "password": "newpass123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn tags_are_scoped_to_their_owner_and_ordered() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base, &unique_email("tags-a")).await;
    let other_token = register_and_token(&client, &base, &unique_email("tags-b")).await;

    for name in ["Dessert", "Vegan"] {
        let response = client
            .post(format!("{base}/tags"))
            .bearer_auth(&token)
            .json(&json!({"name": name}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    client
        .post(format!("{base}/tags"))
        .bearer_auth(&other_token)
        .json(&json!({"name": "Fruity"}))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("{base}/tags"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Vegan", "Dessert"]);

    // Blank name is rejected
    let response = client
        .post(format!("{base}/tags"))
        .bearer_auth(&token)
        .json(&json!({"name": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn assigned_only_filters_and_deduplicates() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base, &unique_email("assigned")).await;

    let create_tag = |name: &str| {
        let client = client.clone();
        let base = base.clone();
        let token = token.clone();
        let name = name.to_string();
        async move {
            let response = client
                .post(format!("{base}/tags"))
                .bearer_auth(&token)
                .json(&json!({"name": name}))
                .send()
                .await
                .unwrap();
            let body: Value = response.json().await.unwrap();
            body["id"].as_str().unwrap().to_string()
        }
    };

    let used = create_tag("Breakfast").await;
    let _unused = create_tag("Lunch").await;

    for title in ["Pancakes", "Porridge"] {
        let response = client
            .post(format!("{base}/recipes"))
            .bearer_auth(&token)
            .json(&json!({
                "title": title,
                "duration_minutes": 10,
                "price": "3.00",
                "tags": [used],
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = client
        .get(format!("{base}/tags?assigned_only=1"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let tags = body.as_array().unwrap();

    // Only the assigned tag, and only once despite two recipes using it
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["name"], "Breakfast");
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn recipe_create_and_retrieve() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base, &unique_email("recipe")).await;

    let response = client
        .post(format!("{base}/recipes"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Stew",
            "duration_minutes": 90,
            "price": "7.50",
            "link": "https://example.com/stew",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["title"], "Stew");
    assert_eq!(created["duration_minutes"], 90);
    assert_eq!(created["price"], "7.50");
    assert!(created["tags"].as_array().unwrap().is_empty());
    assert!(created["ingredients"].as_array().unwrap().is_empty());

    let id = created["id"].as_str().unwrap();
    let response = client
        .get(format!("{base}/recipes/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let detail: Value = response.json().await.unwrap();
    assert_eq!(detail["link"], "https://example.com/stew");
    assert!(detail["image"].is_null());
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn recipe_with_tags_expands_them_in_detail() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base, &unique_email("nested")).await;

    let mut tag_ids = Vec::new();
    for name in ["Dinner", "Comfort food"] {
        let response = client
            .post(format!("{base}/tags"))
            .bearer_auth(&token)
            .json(&json!({"name": name}))
            .send()
            .await
            .unwrap();
        let body: Value = response.json().await.unwrap();
        tag_ids.push(body["id"].as_str().unwrap().to_string());
    }

    let response = client
        .post(format!("{base}/recipes"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Lasagne",
            "duration_minutes": 60,
            "price": "12.00",
            "tags": tag_ids,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let detail: Value = response.json().await.unwrap();
    let tags = detail["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().all(|t| t["id"].is_string() && t["name"].is_string()));

    // Unknown relation ids are a validation error, not a server error
    let response = client
        .post(format!("{base}/recipes"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Broken",
            "duration_minutes": 5,
            "price": "1.00",
            "tags": [uuid::Uuid::new_v4()],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn put_clears_relations_patch_keeps_them() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base, &unique_email("update")).await;

    let response = client
        .post(format!("{base}/tags"))
        .bearer_auth(&token)
        .json(&json!({"name": "Curry"}))
        .send()
        .await
        .unwrap();
    let tag: Value = response.json().await.unwrap();
    let tag_id = tag["id"].as_str().unwrap();

    let response = client
        .post(format!("{base}/recipes"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Chicken tikka",
            "duration_minutes": 25,
            "price": "6.00",
            "tags": [tag_id],
        }))
        .send()
        .await
        .unwrap();
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["tags"].as_array().unwrap().len(), 1);

    // PATCH without a tags array keeps the existing set
    let response = client
        .patch(format!("{base}/recipes/{id}"))
        .bearer_auth(&token)
        .json(&json!({"title": "Chicken tikka masala"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let patched: Value = response.json().await.unwrap();
    assert_eq!(patched["title"], "Chicken tikka masala");
    assert_eq!(patched["tags"].as_array().unwrap().len(), 1);
    assert_eq!(patched["price"], "6.00");

    // PUT without a tags array clears it
    let response = client
        .put(format!("{base}/recipes/{id}"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Plain chicken",
            "duration_minutes": 20,
            "price": "5.00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let replaced: Value = response.json().await.unwrap();
    assert!(replaced["tags"].as_array().unwrap().is_empty());
    assert!(replaced["link"].is_null());
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn recipes_filter_by_tags_and_ingredients() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base, &unique_email("filter")).await;

    let response = client
        .post(format!("{base}/tags"))
        .bearer_auth(&token)
        .json(&json!({"name": "Quick"}))
        .send()
        .await
        .unwrap();
    let tag: Value = response.json().await.unwrap();
    let tag_id = tag["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{base}/ingredients"))
        .bearer_auth(&token)
        .json(&json!({"name": "Salt"}))
        .send()
        .await
        .unwrap();
    let ingredient: Value = response.json().await.unwrap();
    let ingredient_id = ingredient["id"].as_str().unwrap().to_string();

    client
        .post(format!("{base}/recipes"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Toast",
            "duration_minutes": 5,
            "price": "1.00",
            "tags": [tag_id],
            "ingredients": [ingredient_id],
        }))
        .send()
        .await
        .unwrap();

    client
        .post(format!("{base}/recipes"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Roast",
            "duration_minutes": 120,
            "price": "15.00",
        }))
        .send()
        .await
        .unwrap();

    // Both filters together narrow to the matching recipe
    let response = client
        .get(format!(
            "{base}/recipes?tags={tag_id}&ingredients={ingredient_id}"
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let recipes = body.as_array().unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0]["title"], "Toast");

    // Malformed filter ids are a validation error
    let response = client
        .get(format!("{base}/recipes?tags=not-a-uuid"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Unfiltered list is newest-first
    let response = client
        .get(format!("{base}/recipes"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Roast", "Toast"]);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn recipes_are_invisible_to_other_users() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = register_and_token(&client, &base, &unique_email("owner")).await;
    let intruder = register_and_token(&client, &base, &unique_email("intruder")).await;

    let response = client
        .post(format!("{base}/recipes"))
        .bearer_auth(&owner)
        .json(&json!({"title": "Secret sauce", "duration_minutes": 5, "price": "2.00"}))
        .send()
        .await
        .unwrap();
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    for request in [
        client.get(format!("{base}/recipes/{id}")),
        client.patch(format!("{base}/recipes/{id}")),
    ] {
        let response = request
            .bearer_auth(&intruder)
            .json(&json!({"title": "Stolen"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    let response = client
        .get(format!("{base}/recipes"))
        .bearer_auth(&intruder)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn superusers_carry_staff_and_superuser_flags() {
    let db_config = DatabaseConfig::from_env().expect("database config");
    let pool = init_pool(&db_config).await.expect("database pool");
    let repository = api::repositories::UserRepository::new(pool);

    let email = unique_email("admin");
    let user = repository
        .create_superuser(&email, "pass123")
        .await
        .expect("create superuser");

    assert!(user.is_staff);
    assert!(user.is_superuser);
    assert!(user.is_active);
    assert!(repository
        .verify_password(&user, "pass123")
        .await
        .expect("verify"));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres database"]
#[serial_test::serial]
async fn image_upload_validates_and_stores() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base, &unique_email("image")).await;

    let response = client
        .post(format!("{base}/recipes"))
        .bearer_auth(&token)
        .json(&json!({"title": "Pie", "duration_minutes": 45, "price": "8.00"}))
        .send()
        .await
        .unwrap();
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    // Not an image
    let form = reqwest::multipart::Form::new().part(
        "image",
        reqwest::multipart::Part::bytes(b"plain text".to_vec()).file_name("notes.txt"),
    );
    let response = client
        .post(format!("{base}/recipes/{id}/image"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Minimal PNG signature passes the sniff
    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    png.extend_from_slice(&[0u8; 32]);
    let form = reqwest::multipart::Form::new().part(
        "image",
        reqwest::multipart::Part::bytes(png).file_name("pie.png"),
    );
    let response = client
        .post(format!("{base}/recipes/{id}/image"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("/uploads/recipe/"));
    assert!(image.ends_with(".png"));
}
