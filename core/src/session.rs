//! The logged-in identity, passed explicitly to identity-aware helpers.
//!
//! The client holds no session of its own. Callers keep a
//! `SessionPrincipal` in whatever application context they have and hand
//! it to each call; `None` means the request goes out unauthenticated.

use serde::{Deserialize, Serialize};

use crate::types::AuthUser;

/// Header carrying the caller's user id on wishlist, cart and profile calls.
pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Identity plus role tag for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPrincipal {
    pub user_id: String,
    pub role: Role,
    /// Bearer token for administrative endpoints.
    pub token: Option<String>,
}

impl SessionPrincipal {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::User,
            token: None,
        }
    }

    pub fn admin(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
            token: Some(token.into()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// `X-User-Id` header for this principal.
    pub fn identity_header(&self) -> (String, String) {
        (USER_ID_HEADER.to_string(), self.user_id.clone())
    }

    /// `Authorization: Bearer ...` header, if the principal carries a token.
    pub fn bearer_header(&self) -> Option<(String, String)> {
        self.token
            .as_ref()
            .map(|token| ("Authorization".to_string(), format!("Bearer {token}")))
    }
}

impl From<&AuthUser> for SessionPrincipal {
    fn from(user: &AuthUser) -> Self {
        Self {
            user_id: user.id.to_string(),
            role: user.role,
            token: None,
        }
    }
}
