use axum::http::{self, Request, StatusCode};
use axum::Router;
use catalog_mock::{app, app_with, Config, Product, Store};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn as_user(method: &str, uri: &str, user: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn as_admin(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, "Bearer admin")
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

// --- search ---

#[tokio::test]
async fn search_paginates_and_reports_filters() {
    let app = app();
    let resp = send(&app, get("/items/search?q=headphone&page=1&size=1")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["products"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total_results"], 3);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["pagination"]["has_more"], true);
    assert_eq!(body["filters_applied"]["search_query"], "headphone");
    assert_eq!(body["meta"]["results_on_page"], 1);
    assert!(body.get("suggestions").is_none());
}

#[tokio::test]
async fn search_applies_numeric_bounds() {
    let app = app();
    let resp = send(&app, get("/items/search?min_rating=4.4&max_price=5000")).await;

    let body: Value = body_json(resp).await;
    let ids: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["product_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["P103", "P125"]);
}

#[tokio::test]
async fn empty_search_offers_suggestions() {
    let app = app();
    let resp = send(&app, get("/items/search?q=zzzz")).await;

    let body: Value = body_json(resp).await;
    assert!(body["products"].as_array().unwrap().is_empty());
    assert_eq!(body["suggestions"]["original_query"], "zzzz");
    assert_eq!(body["suggestions"]["popular_products"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn search_rejects_non_numeric_bound() {
    let app = app();
    let resp = send(&app, get("/items/search?min_price=cheap")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("query string"), "{body}");
}

#[tokio::test]
async fn search_far_past_the_end_is_an_empty_page() {
    let app = app();
    let resp = send(&app, get("/items/search?page=3&size=18446744073709551615")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert!(body["products"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["has_more"], false);
}

// --- items ---

#[tokio::test]
async fn item_details_include_related() {
    let app = app();
    let resp = send(&app, get("/items/P100")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["product"]["product_id"], "P100");
    assert_eq!(body["related"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn item_details_not_found_has_detail() {
    let app = app();
    let resp = send(&app, get("/items/NOPE")).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Item not found");
}

#[tokio::test]
async fn categories_are_sorted_and_unique() {
    let app = app();
    let resp = send(&app, get("/items/categories/list")).await;

    let body: Value = body_json(resp).await;
    assert_eq!(
        body["categories"],
        serde_json::json!(["Accessories", "Electronics", "Home&Kitchen"])
    );
}

#[tokio::test]
async fn recommend_respects_limit() {
    let app = app();
    let resp = send(&app, get("/items/recommend?query=headphones&limit=1")).await;

    let body: Value = body_json(resp).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["total_found"], 1);
    assert_eq!(body["query"], "headphones");
}

#[tokio::test]
async fn place_autocomplete_matches_prefix() {
    let app = app();
    let resp = send(&app, get("/external/places/autocomplete?input=ka")).await;

    let body: Value = body_json(resp).await;
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0]["description"], "Kamloops, BC, Canada");
}

// --- wishlist ---

#[tokio::test]
async fn wishlist_add_check_remove() {
    let app = app();

    let resp = send(&app, as_user("POST", "/wishlist/P123", "7")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Item added to wishlist");

    let resp = send(&app, as_user("GET", "/wishlist/P123/check", "7")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["is_in_wishlist"], true);

    let resp = send(&app, as_user("GET", "/wishlist/P123/check", "8")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["is_in_wishlist"], false);

    let resp = send(&app, as_user("GET", "/wishlist/count", "7")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["count"], 1);

    let resp = send(&app, as_user("DELETE", "/wishlist/P123", "7")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, as_user("DELETE", "/wishlist/P123", "7")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wishlist_add_unknown_product_is_404() {
    let app = app();
    let resp = send(&app, as_user("POST", "/wishlist/NOPE", "7")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- cart ---

#[tokio::test]
async fn cart_lists_added_products() {
    let app = app();

    let resp = send(&app, as_user("POST", "/cart/add?product_id=P102", "7")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, as_user("GET", "/cart", "7")).await;
    let cart: Vec<Product> = body_json(resp).await;
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].product_id, "P102");

    let resp = send(&app, as_user("DELETE", "/cart/remove?product_id=P102", "7")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, as_user("GET", "/cart", "7")).await;
    let cart: Vec<Product> = body_json(resp).await;
    assert!(cart.is_empty());
}

#[tokio::test]
async fn cart_add_without_product_id_is_400() {
    let app = app();
    let resp = send(&app, as_user("POST", "/cart/add", "7")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("product_id"), "{body}");
}

// --- auth & profile ---

#[tokio::test]
async fn register_then_login_then_rename() {
    let app = app();

    let resp = send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            r#"{"email":"ada@example.com","password":"pw","name":"Ada"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: Value = body_json(resp).await;
    assert_eq!(user["role"], "user");
    assert!(user.get("password").is_none());
    let id = user["id"].as_u64().unwrap();

    let resp = send(
        &app,
        json_request("POST", "/auth/login", r#"{"email":"ada@example.com","password":"pw"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
        &app,
        json_request("PATCH", &format!("/profile/{id}"), r#"{"name":"Ada L."}"#),
    )
    .await;
    let user: Value = body_json(resp).await;
    assert_eq!(user["name"], "Ada L.");
}

#[tokio::test]
async fn duplicate_registration_is_409() {
    let app = app();
    let body = r#"{"email":"admin@catalog.local","password":"x"}"#;
    let resp = send(&app, json_request("POST", "/auth/register", body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn bad_login_is_401_with_detail() {
    let app = app();
    let body = r#"{"email":"admin@catalog.local","password":"wrong"}"#;
    let resp = send(&app, json_request("POST", "/auth/login", body)).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Invalid email or password");
}

#[tokio::test]
async fn unknown_profile_is_404() {
    let app = app();
    let resp = send(&app, get("/profile/999")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_profile_id_is_400_with_detail() {
    let app = app();
    let resp = send(&app, get("/profile/ada")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body["detail"].is_string(), "{body}");
}

#[tokio::test]
async fn malformed_login_body_has_detail() {
    let app = app();
    let resp = send(&app, json_request("POST", "/auth/login", r#"{"email":"ada@example.com"}"#)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("password"), "{body}");
}

// --- admin ---

#[tokio::test]
async fn admin_create_update_delete() {
    let app = app();

    let resp = send(
        &app,
        as_admin(
            "POST",
            "/admin/items",
            r#"{"product_id":"P900","product_name":"Desk Mat","category":"Accessories"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(&app, as_admin("PATCH", "/admin/items/P900", r#"{"rating":"4.8"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let product: Product = body_json(resp).await;
    assert_eq!(product.rating.as_deref(), Some("4.8"));
    assert_eq!(product.product_name, "Desk Mat");

    let resp = send(&app, as_admin("DELETE", "/admin/items/P900", "")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = send(&app, get("/items/P900")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_create_assigns_id_when_missing() {
    let app = app();
    let resp = send(
        &app,
        as_admin("POST", "/admin/items", r#"{"product_name":"Mug","category":"Home&Kitchen"}"#),
    )
    .await;

    let product: Product = body_json(resp).await;
    assert!(!product.product_id.is_empty());
}

#[tokio::test]
async fn admin_delete_unknown_is_404() {
    let app = app();
    let resp = send(&app, as_admin("DELETE", "/admin/items/NOPE", "")).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Item not found");
}

#[tokio::test]
async fn admin_routes_reject_missing_token() {
    let app = app();
    let resp = send(&app, json_request("DELETE", "/admin/items/P100", "")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_token_is_configurable() {
    let config = Config {
        admin_token: "rotated".to_string(),
        ..Config::default()
    };
    let app = app_with(&config, Store::seeded());

    let resp = send(&app, as_admin("DELETE", "/admin/items/P100", "")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
