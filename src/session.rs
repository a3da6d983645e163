//! A session persists headers, cookies and credentials across requests.

use crate::auth::Auth;
use crate::cookies::CookieJar;
use crate::error::Error;
use crate::executor::Executor;
use crate::request::{Body, Request};
use crate::response::Response;
use http::{HeaderMap, HeaderValue, Method};
use std::time::Duration;

const USER_AGENT: &str = concat!("requin/", env!("CARGO_PKG_VERSION"));

/// A reusable context carrying default headers, accumulated cookies and an
/// optional credential strategy across multiple logical requests.
///
/// Not safe for concurrent `send` calls on one instance; distinct sessions
/// share nothing. State is released on drop; [`close`](Session::close) is
/// the explicit reset.
#[derive(Debug)]
pub struct Session {
    headers: HeaderMap,
    jar: CookieJar,
    auth: Option<Auth>,
    executor: Executor,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(http::header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            http::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );
        headers.insert(http::header::CONNECTION, HeaderValue::from_static("keep-alive"));

        Self {
            headers,
            jar: CookieJar::new(),
            auth: None,
            executor: Executor::new(),
        }
    }

    /// Add or replace a session-level header, effective for every
    /// subsequent send.
    pub fn add_header(&mut self, name: &str, value: &str) -> &mut Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add or replace a session cookie.
    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.jar.insert(name, value);
        self
    }

    /// Set the credential strategy inherited by requests without their own.
    pub fn set_auth(&mut self, auth: Auth) -> &mut Self {
        self.auth = Some(auth);
        self
    }

    /// Set both the connect and read timeouts at once.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.executor.connect_timeout = timeout;
        self.executor.read_timeout = timeout;
        self
    }

    /// Toggle redirect following for requests sent through this session.
    pub fn set_follow_redirects(&mut self, follow: bool) -> &mut Self {
        self.executor.follow_redirects = follow;
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.jar
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut Executor {
        &mut self.executor
    }

    /// Merge session state into the request, execute it, then harvest the
    /// terminal response's `Set-Cookie` headers into the jar.
    pub async fn send(&mut self, mut request: Request) -> Result<Response, Error> {
        // Session headers first, request headers win on collision.
        let mut merged = self.headers.clone();
        for (name, value) in request.headers() {
            merged.insert(name.clone(), value.clone());
        }
        request.set_headers(merged);

        // Same overlay rule for cookies.
        request.set_cookies(self.jar.merged_with(request.cookies()));

        if request.auth_ref().is_none() {
            if let Some(auth) = &self.auth {
                request.set_auth(auth.clone());
            }
        }

        let response = self.executor.execute(request).await?;

        // Exactly once per call, reflecting only the terminal response.
        self.jar.update_from_headers(response.headers());

        Ok(response)
    }

    /// Construct and send a request with the given method.
    pub async fn request(&mut self, method: Method, url: &str) -> Result<Response, Error> {
        self.send(Request::new(method, url)).await
    }

    pub async fn get(&mut self, url: &str) -> Result<Response, Error> {
        self.request(Method::GET, url).await
    }

    /// GET with query parameters.
    pub async fn get_with_params<I, K, V>(&mut self, url: &str, params: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.send(Request::get(url).params(params)).await
    }

    pub async fn post(&mut self, url: &str, body: impl Into<Body>) -> Result<Response, Error> {
        self.send(Request::post(url).body(body)).await
    }

    /// POST a JSON payload.
    pub async fn post_json<T: serde::Serialize>(
        &mut self,
        url: &str,
        json: &T,
    ) -> Result<Response, Error> {
        self.send(Request::post(url).json(json)).await
    }

    pub async fn put(&mut self, url: &str, body: impl Into<Body>) -> Result<Response, Error> {
        self.send(Request::new(Method::PUT, url).body(body)).await
    }

    pub async fn patch(&mut self, url: &str, body: impl Into<Body>) -> Result<Response, Error> {
        self.send(Request::new(Method::PATCH, url).body(body)).await
    }

    pub async fn delete(&mut self, url: &str) -> Result<Response, Error> {
        self.request(Method::DELETE, url).await
    }

    pub async fn options(&mut self, url: &str) -> Result<Response, Error> {
        self.request(Method::OPTIONS, url).await
    }

    pub async fn head(&mut self, url: &str) -> Result<Response, Error> {
        self.request(Method::HEAD, url).await
    }

    /// Clear header and cookie state. Dropping the session releases
    /// everything anyway; this is the explicit teardown for callers that
    /// keep the value around.
    pub fn close(&mut self) {
        self.headers.clear();
        self.jar.clear();
        self.auth = None;
    }
}
