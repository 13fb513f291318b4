//! Error types for the catalog API client.
//!
//! # Design
//! Every helper on `CatalogClient` fails with the same `ApiError`, and none
//! of them reinterpret it. The variants follow where the failure happened:
//! the backend could not be reached, it answered with a non-2xx status, or
//! it answered 2xx with a body that is not the JSON the caller asked for.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `CatalogClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed; usually the backend is not running.
    #[error("cannot reach the catalog API at {base_url} ({reason}); is the backend running?")]
    Unreachable { base_url: String, reason: String },

    /// The server returned a non-2xx status. `message` is the server's own
    /// error text when it sent one, otherwise a generic one naming the status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    /// A 2xx body was empty or did not decode into the expected type.
    #[error("invalid response body (HTTP {status}): {reason}")]
    Decode {
        status: u16,
        reason: String,
        body: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Build an `Http` error from a non-2xx status and its raw body.
    ///
    /// The message is taken from a string `detail` or `message` field of a
    /// JSON object body; anything else yields `request failed with status N`.
    pub fn from_status(status: u16, body: String) -> Self {
        let message = error_message(&body).unwrap_or_else(|| format!("request failed with status {status}"));
        ApiError::Http {
            status,
            message,
            body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::Decode { status, .. } => Some(*status),
            ApiError::Unreachable { .. } | ApiError::Serialization(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404, .. })
    }
}

fn error_message(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    let object = payload.as_object()?;
    ["detail", "message"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| value.as_str().filter(|message| !message.is_empty()))
        .map(str::to_string)
}
