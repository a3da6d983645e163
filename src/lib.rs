//! # requin
//!
//! An ergonomic HTTP client library: sessions, cookie persistence,
//! redirect handling, form/JSON bodies and basic auth.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() -> Result<(), requin::Error> {
//!     let response = requin::get("https://httpbin.org/get").await?;
//!     println!("{} {}", response.status_code(), response.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Sessions
//!
//! A [`Session`] persists headers, cookies and credentials across calls:
//!
//! ```rust,ignore
//! let mut session = requin::Session::new();
//! session.set_auth(requin::Auth::basic("user", "passwd"));
//! let first = session.get("https://httpbin.org/cookies/set?k=v").await?;
//! let second = session.get("https://httpbin.org/cookies").await?; // sends k=v
//! ```
//!
//! ## Modules
//!
//! - [`request`] - Request values and body variants
//! - [`response`] - Buffered responses with text/JSON access
//! - [`session`] - Persistent headers, cookie jar and auth
//! - [`executor`] - URL resolution, body encoding and the redirect loop
//! - [`cookies`] - The session cookie jar
//! - [`auth`] - Credential strategies
//! - [`error`] - The failure taxonomy

pub mod auth;
pub mod cookies;
pub mod error;
pub mod executor;
pub mod request;
pub mod response;
pub mod session;

mod transport;

pub use auth::Auth;
pub use cookies::CookieJar;
pub use error::Error;
pub use executor::Executor;
pub use http::Method;
pub use request::{Body, Request};
pub use response::Response;
pub use session::Session;

/// Send a GET request through a short-lived session.
pub async fn get(url: &str) -> Result<Response, Error> {
    Session::new().get(url).await
}

/// Send a GET request with query parameters.
pub async fn get_with_params<I, K, V>(url: &str, params: I) -> Result<Response, Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    Session::new().get_with_params(url, params).await
}

/// Send a POST request with a raw or form body.
pub async fn post(url: &str, body: impl Into<Body>) -> Result<Response, Error> {
    Session::new().post(url, body).await
}

/// Send a POST request with a JSON payload.
pub async fn post_json<T: serde::Serialize>(url: &str, json: &T) -> Result<Response, Error> {
    Session::new().post_json(url, json).await
}

/// Send a PUT request.
pub async fn put(url: &str, body: impl Into<Body>) -> Result<Response, Error> {
    Session::new().put(url, body).await
}

/// Send a PATCH request.
pub async fn patch(url: &str, body: impl Into<Body>) -> Result<Response, Error> {
    Session::new().patch(url, body).await
}

/// Send a DELETE request.
pub async fn delete(url: &str) -> Result<Response, Error> {
    Session::new().delete(url).await
}

/// Send an OPTIONS request.
pub async fn options(url: &str) -> Result<Response, Error> {
    Session::new().options(url).await
}

/// Send a HEAD request.
pub async fn head(url: &str) -> Result<Response, Error> {
    Session::new().head(url).await
}

/// Construct and send a request with an arbitrary method.
pub async fn request(method: Method, url: &str) -> Result<Response, Error> {
    Session::new().request(method, url).await
}
