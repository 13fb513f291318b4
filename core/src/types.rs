//! Domain DTOs for the catalog API.
//!
//! # Design
//! These types mirror the backend's JSON field-for-field. The mock-server
//! crate defines its own copies; the end-to-end tests catch schema drift.
//! Optional attributes are skipped when absent, and `Product` keeps any
//! field it does not know about, so a parsed entry serializes back to the
//! payload it came from.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::query::QueryParams;
use crate::session::Role;

/// Page requested when the caller does not say otherwise.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size for ordinary browsing.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Page size for administrative bulk listing.
pub const BULK_PAGE_SIZE: u32 = 1000;

/// Optional attribute that distinguishes an absent key (`None`) from an
/// explicit `null` (`Some(None)`), so both survive a round trip.
pub type Nullable<T> = Option<Option<T>>;

/// Deserialize a present key, including `null`, as `Some(..)`.
fn present<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A catalog entry.
///
/// Optional attributes are `Nullable` and scores are kept as JSON numbers,
/// so an entry serializes back exactly as the backend sent it. Use the
/// accessor methods for plain values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub category: Nullable<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub discounted_price: Nullable<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub actual_price: Nullable<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Nullable<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub rating: Nullable<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub rating_count: Nullable<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub about_product: Nullable<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub img_link: Nullable<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub product_link: Nullable<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub relevance_score: Nullable<Number>,
    /// Recommendation score.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub score: Nullable<Number>,
    /// Fields containing search query matches.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub highlighted_fields: Nullable<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

macro_rules! text_accessors {
    ($($field:ident),* $(,)?) => {
        $(
            pub fn $field(&self) -> Option<&str> {
                self.$field.as_ref()?.as_deref()
            }
        )*
    };
}

impl Product {
    text_accessors!(
        category,
        discounted_price,
        actual_price,
        discount_percentage,
        rating,
        rating_count,
        about_product,
        img_link,
        product_link,
    );

    pub fn relevance_score(&self) -> Option<f64> {
        self.relevance_score.as_ref()?.as_ref()?.as_f64()
    }

    pub fn score(&self) -> Option<f64> {
        self.score.as_ref()?.as_ref()?.as_f64()
    }

    pub fn highlighted_fields(&self) -> &[String] {
        self.highlighted_fields
            .as_ref()
            .and_then(Option::as_deref)
            .unwrap_or_default()
    }
}

/// Filters and pagination for `GET /items/search`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_discount: Option<f64>,
    pub page: u32,
    pub size: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            q: None,
            category: None,
            min_rating: None,
            max_rating: None,
            min_price: None,
            max_price: None,
            min_discount: None,
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchParams {
    /// Free-text search with default pagination.
    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }

    /// First page at the bulk size, with no filters.
    pub fn bulk() -> Self {
        Self {
            size: BULK_PAGE_SIZE,
            ..Self::default()
        }
    }

    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .push("q", self.q.as_deref())
            .push("category", self.category.as_deref())
            .push("min_rating", self.min_rating)
            .push("max_rating", self.max_rating)
            .push("min_price", self.min_price)
            .push("max_price", self.max_price)
            .push("min_discount", self.min_discount)
            .push("page", Some(self.page))
            .push("size", Some(self.size));
        params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
    pub total_results: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FiltersApplied {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchMeta {
    pub search_time_ms: f64,
    pub results_on_page: u32,
}

/// Alternatives offered when a search comes back empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestions {
    pub original_query: String,
    pub similar_categories: Vec<String>,
    pub popular_products: Vec<Product>,
    pub did_you_mean: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
    pub filters_applied: FiltersApplied,
    pub meta: SearchMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Suggestions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemDetailsResponse {
    pub product: Product,
    pub related: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub items: Vec<Product>,
    pub query: String,
    pub total_found: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacePrediction {
    pub description: String,
    pub place_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacesAutocompleteResponse {
    pub predictions: Vec<PlacePrediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WishlistResponse {
    pub products: Vec<Product>,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WishlistMutation {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WishlistCheck {
    pub is_in_wishlist: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The account returned by register, login and profile endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Profile changes. Only the fields present are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Payload for `POST /admin/items`. The server assigns `product_id` when
/// it is omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub product_name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_link: Option<String>,
}

/// Payload for `PATCH /admin/items/{id}`. Omitted fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_keeps_unknown_fields_and_skips_absent_ones() {
        let raw = r#"{"product_id":"P1","product_name":"Cable","rating":"4.2","warehouse":"B7"}"#;
        let product: Product = serde_json::from_str(raw).unwrap();
        assert_eq!(product.rating(), Some("4.2"));
        assert_eq!(product.category, None);
        assert_eq!(product.extra["warehouse"], "B7");

        let back = serde_json::to_value(&product).unwrap();
        let original: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn product_keeps_nulls_and_integer_scores() {
        let raw = r#"{"product_id":"P1","product_name":"x","category":null,"relevance_score":1,"score":0.5}"#;
        let product: Product = serde_json::from_str(raw).unwrap();
        assert_eq!(product.category, Some(None));
        assert_eq!(product.category(), None);
        assert_eq!(product.relevance_score(), Some(1.0));
        assert_eq!(product.score(), Some(0.5));
        assert!(product.highlighted_fields().is_empty());

        let back = serde_json::to_value(&product).unwrap();
        let original: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(back, original);
        assert_eq!(serde_json::to_string(&product).unwrap(), raw);
    }

    #[test]
    fn product_requires_id_and_name() {
        let result: Result<Product, _> = serde_json::from_str(r#"{"product_name":"No id"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn search_params_default_to_first_browsing_page() {
        let params = SearchParams::default();
        assert_eq!(params.page, DEFAULT_PAGE);
        assert_eq!(params.size, DEFAULT_PAGE_SIZE);
        assert_eq!(params.to_query().to_query_string(), "?page=1&size=20");
    }

    #[test]
    fn bulk_params_use_bulk_size() {
        assert_eq!(SearchParams::bulk().to_query().to_query_string(), "?page=1&size=1000");
    }

    #[test]
    fn search_params_emit_filters_in_backend_order() {
        let params = SearchParams {
            q: Some("headphones".to_string()),
            category: Some(String::new()),
            min_rating: Some(4.0),
            max_price: Some(2500.0),
            ..SearchParams::default()
        };
        assert_eq!(
            params.to_query().to_query_string(),
            "?q=headphones&min_rating=4&max_price=2500&page=1&size=20"
        );
    }

    #[test]
    fn item_patch_serializes_only_present_fields() {
        let patch = ItemPatch {
            discounted_price: Some("499".to_string()),
            ..ItemPatch::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({"discounted_price": "499"}));
    }

    #[test]
    fn auth_user_role_is_lowercase() {
        let user: AuthUser =
            serde_json::from_str(r#"{"id":3,"email":"a@b.c","name":"A","role":"admin"}"#).unwrap();
        assert_eq!(user.role, Role::Admin);
    }
}
