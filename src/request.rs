//! The user-created request value.

use crate::auth::Auth;
use bytes::Bytes;
use http::{HeaderMap, Method};
use std::collections::BTreeMap;

/// Raw or form request payload.
///
/// A JSON payload lives in its own [`Request`] field so that setting one
/// never destroys a previously set body; at encode time JSON always wins.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No body is written on the wire.
    #[default]
    Empty,
    /// Raw bytes, sent as-is with no forced Content-Type.
    Raw(Bytes),
    /// Form pairs, percent-encoded and sent as
    /// `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

impl Body {
    /// Build a form body from any iterator of name/value pairs.
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Body::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Raw(Bytes::from(s))
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Raw(Bytes::from(s.to_owned()))
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::Raw(Bytes::from(v))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Raw(b)
    }
}

/// A single logical HTTP request.
///
/// Built by the caller (or by [`Session`](crate::Session) convenience
/// methods) via chained setters, then moved into the executor. The same
/// value is resent across redirect hops; nothing set here changes between
/// hops.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    cookies: BTreeMap<String, String>,
    body: Body,
    json: Option<Result<serde_json::Value, String>>,
    auth: Option<Auth>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            params: Vec::new(),
            cookies: BTreeMap::new(),
            body: Body::Empty,
            json: None,
            auth: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Add or replace a header. Invalid names or values are silently
    /// dropped, matching the builder-style API of the wire layer.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<http::header::HeaderName>(),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a query parameter, appended to the URL at execution time.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn params<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a request-level cookie; overrides a session cookie of the same
    /// name on merge.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Set the raw or form body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set form pairs as the body.
    pub fn form<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Body::form(pairs);
        self
    }

    /// Set a JSON payload. Takes precedence over any raw or form body at
    /// encode time. A value that fails to serialize (e.g. a map with
    /// non-string keys) is kept as the failure and surfaces as an error
    /// when the request is sent.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.json = Some(serde_json::to_value(value).map_err(|e| e.to_string()));
        self
    }

    /// Attach a credential strategy for this request only.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub(crate) fn set_headers(&mut self, headers: HeaderMap) {
        self.headers = headers;
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub(crate) fn set_cookies(&mut self, cookies: BTreeMap<String, String>) {
        self.cookies = cookies;
    }

    pub fn body_ref(&self) -> &Body {
        &self.body
    }

    pub fn json_ref(&self) -> Option<&serde_json::Value> {
        self.json.as_ref().and_then(|state| state.as_ref().ok())
    }

    /// JSON payload state including a failed serialization attempt.
    pub(crate) fn json_state(&self) -> Option<&Result<serde_json::Value, String>> {
        self.json.as_ref()
    }

    pub fn auth_ref(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub(crate) fn set_auth(&mut self, auth: Auth) {
        self.auth = Some(auth);
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Request [{}]>", self.method)
    }
}
