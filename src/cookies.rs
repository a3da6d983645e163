//! Session cookie jar.
//!
//! A deliberately simple name -> value store: `Domain`, `Path` and
//! `Expires` attributes from `Set-Cookie` are ignored, so cookies from
//! different paths or domains within one session collide by name. This is
//! a known scope limitation, not full RFC 6265 handling.

use http::header::SET_COOKIE;
use http::HeaderMap;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    store: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a cookie.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.store.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.store.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.store.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Start from this jar and overlay `overrides`; overriding values win
    /// on name collision. Returns the merged mapping.
    pub fn merged_with(
        &self,
        overrides: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut merged = self.store.clone();
        for (name, value) in overrides {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Harvest every `Set-Cookie` header into the jar, overwriting repeat
    /// names.
    pub fn update_from_headers(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            if let Ok(line) = value.to_str() {
                if let Some((name, value)) = parse_set_cookie(line) {
                    tracing::trace!(cookie = %name, "storing session cookie");
                    self.store.insert(name, value);
                }
            }
        }
    }
}

/// Parse the leading `name=value` token of a `Set-Cookie` line, trimming
/// whitespace on both sides. Attributes after the first `;` are discarded.
pub fn parse_set_cookie(line: &str) -> Option<(String, String)> {
    let first = line.split(';').next()?;
    let (name, value) = first.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Join cookies into a single `Cookie` header value: `name=value` pairs
/// separated by `; `. Order across cookies is not contractually
/// significant; the jar iterates in name order.
pub fn cookie_header_value(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
