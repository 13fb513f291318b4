//! Blocking API client for the product catalog service.
//!
//! # Overview
//! `CatalogClient` is the single path to the catalog backend: search,
//! item details, categories, recommendations, wishlist and cart
//! membership, registration and login, profile edits, and the
//! administrative item mutations.
//!
//! # Design
//! - Each call builds an `HttpRequest`, runs it through a `Transport`, and
//!   parses the `HttpResponse`; the transport is the only I/O.
//! - Failures share one shape, `ApiError`, and helpers never rewrite it.
//! - The session principal is an explicit argument, never ambient state.
//! - DTOs are defined independently from the mock-server crate; the
//!   end-to-end tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod session;
pub mod types;

pub use client::{CatalogClient, RequestOptions, DEFAULT_RECOMMENDATION_LIMIT};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use query::QueryParams;
pub use session::{Role, SessionPrincipal, USER_ID_HEADER};
pub use types::*;
