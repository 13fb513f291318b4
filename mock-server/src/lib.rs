//! In-memory stand-in for the catalog backend.
//!
//! Serves the same routes and JSON shapes as the real service so the client
//! crate can be exercised end to end. Errors use the `{"detail": "..."}`
//! body the real service sends.

pub mod config;
pub mod error;
pub mod store;

use std::{sync::Arc, time::Instant};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub use config::Config;
pub use error::AppError;
use error::{ApiJson, ApiPath, ApiQuery};
pub use store::{ItemPatch, NewItem, Product, SearchFilter, Store, User, GUEST};

/// Header identifying the caller on wishlist, cart and profile routes.
pub const USER_ID_HEADER: &str = "x-user-id";

const DEFAULT_PAGE_SIZE: usize = 20;

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub admin_token: Arc<str>,
}

/// Router over a freshly seeded store with default settings.
pub fn app() -> Router {
    app_with(&Config::default(), Store::seeded())
}

pub fn app_with(config: &Config, store: Store) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(store)),
        admin_token: Arc::from(config.admin_token.as_str()),
    };
    Router::new()
        .route("/items/search", get(search_items))
        .route("/items/categories/list", get(list_categories))
        .route("/items/recommend", get(recommend))
        .route("/items/{id}", get(item_details))
        .route("/external/places/autocomplete", get(place_autocomplete))
        .route("/wishlist", get(get_wishlist))
        .route("/wishlist/count", get(wishlist_count))
        .route("/wishlist/{id}", post(add_to_wishlist).delete(remove_from_wishlist))
        .route("/wishlist/{id}/check", get(check_wishlist))
        .route("/cart", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/remove", axum::routing::delete(remove_from_cart))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/profile/{id}", get(get_profile).patch(update_profile))
        .route("/admin/items", post(create_item))
        .route("/admin/items/{id}", patch(update_item).delete(delete_item))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: &Config) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("catalog mock listening on {addr}");
    }
    axum::serve(listener, app_with(config, Store::seeded())).await
}

fn user_key(headers: &HeaderMap) -> String {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(GUEST)
        .to_string()
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .ok_or_else(|| AppError::Forbidden("Missing or invalid token".to_string()))?;
    if token != &*state.admin_token {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }
    Ok(())
}

// --- catalog ---

// serde_urlencoded cannot parse numbers through `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
    category: Option<String>,
    min_rating: Option<f64>,
    max_rating: Option<f64>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    min_discount: Option<f64>,
    page: Option<usize>,
    size: Option<usize>,
}

impl SearchQuery {
    fn filter(&self) -> SearchFilter {
        SearchFilter {
            q: self.q.clone(),
            category: self.category.clone(),
            min_rating: self.min_rating,
            max_rating: self.max_rating,
            min_price: self.min_price,
            max_price: self.max_price,
            min_discount: self.min_discount,
        }
    }
}

#[derive(Serialize)]
struct Pagination {
    page: usize,
    size: usize,
    total_results: usize,
    total_pages: usize,
    has_more: bool,
}

async fn search_items(State(state): State<AppState>, ApiQuery(query): ApiQuery<SearchQuery>) -> Json<Value> {
    let started = Instant::now();
    let page = query.page.unwrap_or(1).max(1);
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let filter = query.filter();

    let store = state.db.read().await;
    let matches = store.search(&filter);
    let total_results = matches.len();
    let total_pages = total_results.div_ceil(size);
    let products: Vec<Product> = matches.into_iter().skip((page - 1).saturating_mul(size)).take(size).collect();
    debug!(total_results, page, size, "search");

    let search_query = filter.q.clone().filter(|q| !q.is_empty());
    let suggestions = match &search_query {
        Some(q) if total_results == 0 => Some(json!({
            "original_query": q,
            "similar_categories": store.categories(),
            "popular_products": store.popular(3),
            "did_you_mean": [],
        })),
        _ => None,
    };

    let mut body = json!({
        "products": products,
        "pagination": Pagination {
            page,
            size,
            total_results,
            total_pages,
            has_more: page < total_pages,
        },
        "filters_applied": filters_applied(&filter),
        "meta": {
            "search_time_ms": started.elapsed().as_secs_f64() * 1000.0,
            "results_on_page": products.len(),
        },
    });
    if let Some(suggestions) = suggestions {
        body["suggestions"] = suggestions;
    }
    Json(body)
}

fn filters_applied(filter: &SearchFilter) -> Value {
    let mut applied = serde_json::Map::new();
    let text = [("search_query", &filter.q), ("category", &filter.category)];
    for (key, value) in text {
        if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
            applied.insert(key.to_string(), json!(value));
        }
    }
    let bounds = [
        ("min_rating", filter.min_rating),
        ("max_rating", filter.max_rating),
        ("min_price", filter.min_price),
        ("max_price", filter.max_price),
        ("min_discount", filter.min_discount),
    ];
    for (key, value) in bounds {
        if let Some(value) = value {
            applied.insert(key.to_string(), json!(value));
        }
    }
    Value::Object(applied)
}

async fn list_categories(State(state): State<AppState>) -> Json<Value> {
    let store = state.db.read().await;
    Json(json!({ "categories": store.categories() }))
}

#[derive(Debug, Deserialize)]
struct RecommendQuery {
    query: String,
    limit: Option<usize>,
}

async fn recommend(State(state): State<AppState>, ApiQuery(query): ApiQuery<RecommendQuery>) -> Json<Value> {
    let store = state.db.read().await;
    let items = store.recommend(&query.query, query.limit.unwrap_or(10));
    Json(json!({
        "total_found": items.len(),
        "items": items,
        "query": query.query,
    }))
}

async fn item_details(State(state): State<AppState>, ApiPath(id): ApiPath<String>) -> Result<Json<Value>, AppError> {
    let store = state.db.read().await;
    let product = store.product(&id)?;
    Ok(Json(json!({
        "related": store.related(product),
        "product": product,
    })))
}

#[derive(Debug, Deserialize)]
struct PlacesQuery {
    input: String,
}

const PLACES: [&str; 6] = [
    "Kelowna, BC, Canada",
    "Kamloops, BC, Canada",
    "Vancouver, BC, Canada",
    "Victoria, BC, Canada",
    "Calgary, AB, Canada",
    "Toronto, ON, Canada",
];

async fn place_autocomplete(ApiQuery(query): ApiQuery<PlacesQuery>) -> Json<Value> {
    let needle = query.input.trim().to_lowercase();
    let predictions: Vec<Value> = PLACES
        .iter()
        .enumerate()
        .filter(|(_, place)| !needle.is_empty() && place.to_lowercase().starts_with(&needle))
        .map(|(i, place)| json!({ "description": place, "place_id": format!("place-{i}") }))
        .collect();
    Json(json!({ "predictions": predictions }))
}

// --- wishlist ---

async fn get_wishlist(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let store = state.db.read().await;
    let products = store.wishlist(&user_key(&headers));
    Json(json!({ "count": products.len(), "products": products }))
}

async fn wishlist_count(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let store = state.db.read().await;
    Json(json!({ "count": store.wishlist(&user_key(&headers)).len() }))
}

async fn add_to_wishlist(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let mut store = state.db.write().await;
    let item = store.add_to_wishlist(&user_key(&headers), &id)?;
    Ok(Json(json!({ "message": "Item added to wishlist", "item": item })))
}

async fn remove_from_wishlist(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let mut store = state.db.write().await;
    store.remove_from_wishlist(&user_key(&headers), &id)?;
    Ok(Json(json!({ "message": "Item removed from wishlist" })))
}

async fn check_wishlist(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    headers: HeaderMap,
) -> Json<Value> {
    let store = state.db.read().await;
    Json(json!({ "is_in_wishlist": store.in_wishlist(&user_key(&headers), &id) }))
}

// --- cart ---

#[derive(Debug, Deserialize)]
struct CartQuery {
    product_id: String,
}

async fn get_cart(State(state): State<AppState>, headers: HeaderMap) -> Json<Vec<Product>> {
    let store = state.db.read().await;
    Json(store.cart(&user_key(&headers)))
}

async fn add_to_cart(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CartQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let mut store = state.db.write().await;
    store.add_to_cart(&user_key(&headers), &query.product_id)?;
    Ok(Json(json!({ "message": "Item added to cart" })))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CartQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let mut store = state.db.write().await;
    store.remove_from_cart(&user_key(&headers), &query.product_id)?;
    Ok(Json(json!({ "message": "Item removed from cart" })))
}

// --- auth & profile ---

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct ProfileUpdate {
    name: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let mut store = state.db.write().await;
    let user = store.register(&input.email, &input.password, &input.name)?;
    info!(user_id = user.id, "registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(State(state): State<AppState>, ApiJson(input): ApiJson<LoginRequest>) -> Result<Json<User>, AppError> {
    let store = state.db.read().await;
    store.login(&input.email, &input.password).map(Json)
}

async fn get_profile(State(state): State<AppState>, ApiPath(id): ApiPath<u64>) -> Result<Json<User>, AppError> {
    let store = state.db.read().await;
    store.user(id).cloned().map(Json)
}

async fn update_profile(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
    ApiJson(input): ApiJson<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let mut store = state.db.write().await;
    store.rename_user(id, input.name).map(Json)
}

// --- admin ---

async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<NewItem>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    require_admin(&state, &headers)?;
    let mut store = state.db.write().await;
    let product = store.create_item(input)?;
    info!(product_id = %product.product_id, "created item");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<ItemPatch>,
) -> Result<Json<Product>, AppError> {
    require_admin(&state, &headers)?;
    let mut store = state.db.write().await;
    store.update_item(&id, input).map(Json)
}

async fn delete_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &headers)?;
    let mut store = state.db.write().await;
    store.delete_item(&id)?;
    info!(product_id = %id, "deleted item");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, value.parse().unwrap());
        }
        map
    }

    fn state() -> AppState {
        AppState {
            db: Arc::new(RwLock::new(Store::empty())),
            admin_token: Arc::from("admin"),
        }
    }

    #[test]
    fn user_key_defaults_to_guest() {
        assert_eq!(user_key(&HeaderMap::new()), GUEST);
        assert_eq!(user_key(&headers(&[("x-user-id", " ")])), GUEST);
        assert_eq!(user_key(&headers(&[("x-user-id", "42")])), "42");
    }

    #[test]
    fn admin_requires_matching_bearer_token() {
        let state = state();
        assert!(require_admin(&state, &headers(&[("authorization", "Bearer admin")])).is_ok());
        assert_eq!(
            require_admin(&state, &headers(&[("authorization", "Bearer nope")])),
            Err(AppError::Forbidden("Admin role required".to_string()))
        );
        assert_eq!(
            require_admin(&state, &HeaderMap::new()),
            Err(AppError::Forbidden("Missing or invalid token".to_string()))
        );
    }

    #[test]
    fn filters_applied_skips_empty_and_absent() {
        let filter = SearchFilter {
            q: Some(String::new()),
            category: Some("Electronics".to_string()),
            min_rating: Some(4.0),
            ..SearchFilter::default()
        };
        assert_eq!(
            filters_applied(&filter),
            json!({ "category": "Electronics", "min_rating": 4.0 })
        );
    }
}
