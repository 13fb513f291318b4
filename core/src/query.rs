//! Query-string and path-segment construction.
//!
//! Parameters are kept in insertion order. A parameter whose value is
//! `None`, or renders to an empty string, is never added: the backend must
//! see "filter not specified" rather than `filter=`.

use std::fmt::Display;

/// Ordered set of query parameters that drops absent and empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name=value` unless the value is `None` or renders empty.
    pub fn push<V: Display>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.is_empty() {
                self.pairs.push((name.to_string(), value));
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// `""` when empty, otherwise `?` followed by the url-encoded pairs.
    pub fn to_query_string(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.pairs {
            serializer.append_pair(name, value);
        }
        format!("?{}", serializer.finish())
    }
}

/// Percent-encode a single path segment such as an item id.
pub fn encode_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
