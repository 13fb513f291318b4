//! HTTP resource client for the catalog API.
//!
//! # Design
//! `CatalogClient` holds a base URL and a `Transport` and nothing else; the
//! session is passed into each call. Every operation goes through the same
//! three steps: `build_request` produces an `HttpRequest`, the transport
//! executes it, and `parse_response` turns the `HttpResponse` into a typed
//! value or an `ApiError`. The build and parse halves are public so callers
//! and tests can drive them without a network.
//!
//! The resource helpers only build paths and query strings. They never
//! catch or rewrite the errors of the generic request.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::query::{encode_segment, QueryParams};
use crate::session::SessionPrincipal;
use crate::types::{
    AuthUser, CategoryResponse, CountResponse, ItemDetailsResponse, ItemPatch, LoginRequest,
    MessageResponse, NewItem, PlacesAutocompleteResponse, Product, ProfileUpdate,
    RecommendationResponse, RegisterRequest, SearchParams, SearchResponse, WishlistCheck,
    WishlistMutation, WishlistResponse,
};

/// Number of recommendations requested when the caller does not say.
pub const DEFAULT_RECOMMENDATION_LIMIT: u32 = 10;

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";

/// Method, extra headers and optional JSON body for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn post() -> Self {
        Self::new(HttpMethod::Post)
    }

    pub fn patch() -> Self {
        Self::new(HttpMethod::Patch)
    }

    pub fn delete() -> Self {
        Self::new(HttpMethod::Delete)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` to JSON text and attach it.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.body = Some(body);
        Ok(self)
    }

    fn identity(self, session: Option<&SessionPrincipal>) -> Self {
        match session {
            Some(principal) => {
                let (name, value) = principal.identity_header();
                self.header(name, value)
            }
            None => self,
        }
    }

    fn bearer(self, admin: &SessionPrincipal) -> Self {
        match admin.bearer_header() {
            Some((name, value)) => self.header(name, value),
            None => self,
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// Blocking client for the catalog backend.
#[derive(Debug, Clone)]
pub struct CatalogClient<T = UreqTransport> {
    base_url: String,
    transport: T,
}

impl CatalogClient<UreqTransport> {
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(base_url, UreqTransport::new())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    /// Client for the base URL in `CATALOG_API_URL`, or the local default.
    pub fn from_env() -> Self {
        Self::from_config(&ClientConfig::from_env())
    }
}

impl<T: Transport> CatalogClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join `endpoint` onto the base URL and merge headers.
    ///
    /// `Content-Type: application/json` is always present unless the caller
    /// supplies its own value, compared case-insensitively.
    pub fn build_request(&self, endpoint: &str, options: &RequestOptions) -> HttpRequest {
        let mut headers = Vec::with_capacity(options.headers.len() + 1);
        if !options
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE))
        {
            headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
        }
        for (name, value) in &options.headers {
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some(existing) => existing.1 = value.clone(),
                None => headers.push((name.clone(), value.clone())),
            }
        }

        HttpRequest {
            method: options.method,
            url: format!("{}{}", self.base_url, endpoint),
            headers,
            body: options.body.clone(),
        }
    }

    /// Decode a 2xx JSON body into `R`; map anything else to `ApiError`.
    pub fn parse_response<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R, ApiError> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Err(ApiError::Decode {
                status: response.status,
                reason: "empty body where JSON was expected".to_string(),
                body: response.body,
            });
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode {
            status: response.status,
            reason: e.to_string(),
            body: response.body,
        })
    }

    /// Accept any 2xx response and ignore its body.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// Send a request and decode its JSON response.
    pub fn request<R: DeserializeOwned>(&self, endpoint: &str, options: RequestOptions) -> Result<R, ApiError> {
        let response = self.execute(self.build_request(endpoint, &options))?;
        self.parse_response(response)
    }

    /// Send a request whose success response carries no body.
    pub fn request_empty(&self, endpoint: &str, options: RequestOptions) -> Result<(), ApiError> {
        let response = self.execute(self.build_request(endpoint, &options))?;
        self.parse_empty(response)
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.transport.execute(&request).map_err(|e| {
            debug!(url = %request.url, error = %e, "transport failure");
            ApiError::Unreachable {
                base_url: self.base_url.clone(),
                reason: e.to_string(),
            }
        })?;
        debug!(status = response.status, url = %request.url, "response received");
        Ok(response)
    }

    // --- catalog ---

    pub fn search_items(&self, params: &SearchParams) -> Result<SearchResponse, ApiError> {
        let endpoint = format!("/items/search{}", params.to_query().to_query_string());
        self.request(&endpoint, RequestOptions::get())
    }

    /// Every catalog entry on one bulk-sized page, for the admin listing.
    pub fn get_all_items(&self) -> Result<SearchResponse, ApiError> {
        self.search_items(&SearchParams::bulk())
    }

    pub fn get_item_details(&self, product_id: &str) -> Result<ItemDetailsResponse, ApiError> {
        self.request(&format!("/items/{}", encode_segment(product_id)), RequestOptions::get())
    }

    pub fn get_categories(&self) -> Result<CategoryResponse, ApiError> {
        self.request("/items/categories/list", RequestOptions::get())
    }

    pub fn get_recommendations(&self, query: &str, limit: Option<u32>) -> Result<RecommendationResponse, ApiError> {
        let mut params = QueryParams::new();
        params
            .push("query", Some(query))
            .push("limit", Some(limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)));
        let endpoint = format!("/items/recommend{}", params.to_query_string());
        self.request(&endpoint, RequestOptions::get())
    }

    pub fn get_place_autocomplete(&self, input: &str) -> Result<PlacesAutocompleteResponse, ApiError> {
        let mut params = QueryParams::new();
        params.push("input", Some(input));
        let endpoint = format!("/external/places/autocomplete{}", params.to_query_string());
        self.request(&endpoint, RequestOptions::get())
    }

    // --- wishlist ---

    pub fn get_wishlist(&self, session: Option<&SessionPrincipal>) -> Result<WishlistResponse, ApiError> {
        self.request("/wishlist", RequestOptions::get().identity(session))
    }

    pub fn add_to_wishlist(
        &self,
        session: Option<&SessionPrincipal>,
        product_id: &str,
    ) -> Result<WishlistMutation, ApiError> {
        let endpoint = format!("/wishlist/{}", encode_segment(product_id));
        self.request(&endpoint, RequestOptions::post().identity(session))
    }

    pub fn remove_from_wishlist(
        &self,
        session: Option<&SessionPrincipal>,
        product_id: &str,
    ) -> Result<MessageResponse, ApiError> {
        let endpoint = format!("/wishlist/{}", encode_segment(product_id));
        self.request(&endpoint, RequestOptions::delete().identity(session))
    }

    pub fn check_wishlist(
        &self,
        session: Option<&SessionPrincipal>,
        product_id: &str,
    ) -> Result<WishlistCheck, ApiError> {
        let endpoint = format!("/wishlist/{}/check", encode_segment(product_id));
        self.request(&endpoint, RequestOptions::get().identity(session))
    }

    pub fn get_wishlist_count(&self, session: Option<&SessionPrincipal>) -> Result<CountResponse, ApiError> {
        self.request("/wishlist/count", RequestOptions::get().identity(session))
    }

    // --- cart ---

    pub fn get_cart(&self, session: Option<&SessionPrincipal>) -> Result<Vec<Product>, ApiError> {
        self.request("/cart", RequestOptions::get().identity(session))
    }

    pub fn add_to_cart(
        &self,
        session: Option<&SessionPrincipal>,
        product_id: &str,
    ) -> Result<MessageResponse, ApiError> {
        self.request(&cart_endpoint("add", product_id), RequestOptions::post().identity(session))
    }

    pub fn remove_from_cart(
        &self,
        session: Option<&SessionPrincipal>,
        product_id: &str,
    ) -> Result<MessageResponse, ApiError> {
        self.request(&cart_endpoint("remove", product_id), RequestOptions::delete().identity(session))
    }

    // --- auth & profile ---

    pub fn register(&self, input: &RegisterRequest) -> Result<AuthUser, ApiError> {
        self.request("/auth/register", RequestOptions::post().json(input)?)
    }

    pub fn login(&self, input: &LoginRequest) -> Result<AuthUser, ApiError> {
        self.request("/auth/login", RequestOptions::post().json(input)?)
    }

    pub fn get_profile(&self, session: Option<&SessionPrincipal>, user_id: u64) -> Result<AuthUser, ApiError> {
        self.request(&format!("/profile/{user_id}"), RequestOptions::get().identity(session))
    }

    pub fn update_profile(
        &self,
        session: Option<&SessionPrincipal>,
        user_id: u64,
        input: &ProfileUpdate,
    ) -> Result<AuthUser, ApiError> {
        let options = RequestOptions::patch().identity(session).json(input)?;
        self.request(&format!("/profile/{user_id}"), options)
    }

    // --- admin ---

    pub fn create_item(&self, admin: &SessionPrincipal, input: &NewItem) -> Result<Product, ApiError> {
        self.request("/admin/items", RequestOptions::post().bearer(admin).json(input)?)
    }

    pub fn update_item(
        &self,
        admin: &SessionPrincipal,
        product_id: &str,
        input: &ItemPatch,
    ) -> Result<Product, ApiError> {
        let endpoint = format!("/admin/items/{}", encode_segment(product_id));
        self.request(&endpoint, RequestOptions::patch().bearer(admin).json(input)?)
    }

    pub fn delete_item(&self, admin: &SessionPrincipal, product_id: &str) -> Result<(), ApiError> {
        let endpoint = format!("/admin/items/{}", encode_segment(product_id));
        self.request_empty(&endpoint, RequestOptions::delete().bearer(admin))
    }
}

fn cart_endpoint(action: &str, product_id: &str) -> String {
    let mut params = QueryParams::new();
    params.push("product_id", Some(product_id));
    format!("/cart/{action}{}", params.to_query_string())
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, response.body.clone()))
}
