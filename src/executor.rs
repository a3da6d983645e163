//! Request execution state machine.
//!
//! Performs one logical request/response exchange: resolves the effective
//! URL, applies auth and cookies, encodes the body, opens a one-shot
//! connection per physical attempt and follows redirects in a sequential
//! in-call loop until a terminal response or the hop limit.

use crate::cookies::cookie_header_value;
use crate::error::Error;
use crate::request::{Body, Request};
use crate::response::Response;
use crate::transport::Connection;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE, HOST, LOCATION};
use http::{HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};
use std::time::Duration;
use url::Url;

/// Default for both the connect-phase and read-phase timeouts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed redirect hop limit.
pub const MAX_REDIRECTS: usize = 30;

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Executes requests. Holds only configuration; every call is independent.
#[derive(Debug, Clone)]
pub struct Executor {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirects: usize,
}

impl Default for Executor {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            follow_redirects: true,
            max_redirects: MAX_REDIRECTS,
        }
    }
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Perform the exchange, following redirects, and assemble a
    /// fully-buffered [`Response`].
    pub async fn execute(&self, mut request: Request) -> Result<Response, Error> {
        let mut url = build_url(request.url(), request.query_params())?;

        // Credentials go in before headers are finalized. Insertion
        // overwrites, so the single application holds for every hop.
        if let Some(auth) = request.auth_ref().cloned() {
            auth.apply(&mut request);
        }

        let (content_type, payload) = encode_body(&request)?;
        let mut history: Vec<Response> = Vec::new();
        let mut hops = 0usize;

        loop {
            let wire_request =
                build_wire_request(&request, &url, content_type, payload.clone())?;

            let mut conn = Connection::open(&url, self.connect_timeout).await?;
            let response = conn.send(wire_request, &url, self.read_timeout).await?;
            let (parts, incoming) = response.into_parts();

            if self.follow_redirects && is_redirect(parts.status) {
                if let Some(location) = parts
                    .headers
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned)
                {
                    if hops >= self.max_redirects {
                        return Err(Error::TooManyRedirects {
                            url,
                            limit: self.max_redirects,
                        });
                    }
                    hops += 1;
                    tracing::debug!(
                        status = parts.status.as_u16(),
                        location = %location,
                        hop = hops,
                        "following redirect"
                    );

                    // Lightweight history entry: status, reason and
                    // headers for the hop just completed, no body.
                    history.push(Response::new(parts.status, parts.headers, url.clone()));

                    // Location may be absolute or relative.
                    url = url
                        .join(&location)
                        .map_err(|_| Error::InvalidUrl(location))?;
                    continue;
                }
            }

            // Terminal exchange: fully buffer the body. A read failure at
            // this stage leaves the body empty rather than failing the
            // call; transport errors before this point still abort.
            let body = match tokio::time::timeout(self.read_timeout, incoming.collect()).await
            {
                Ok(Ok(collected)) => collected.to_bytes(),
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "body read failed, returning empty body");
                    Bytes::new()
                }
                Err(_) => {
                    tracing::debug!("body read timed out, returning empty body");
                    Bytes::new()
                }
            };

            let mut response = Response::new(parts.status, parts.headers, url);
            response.set_body(body);
            response.detect_encoding();
            response.set_history(history);
            response.set_request(request);
            return Ok(response);
        }
    }
}

/// Append query parameters to the base URL: `?` when the base has no query
/// string yet, `&` otherwise. Names and values are percent-encoded
/// independently as UTF-8.
pub(crate) fn build_url(base: &str, params: &[(String, String)]) -> Result<Url, Error> {
    let mut raw = base.to_string();
    if !params.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        raw.push(if base.contains('?') { '&' } else { '?' });
        raw.push_str(&encoded);
    }
    Url::parse(&raw).map_err(|_| Error::InvalidUrl(raw))
}

/// Pick the body representation: JSON wins over form and raw; a raw body
/// is sent as-is with no forced Content-Type; no variant set means no
/// body at all.
fn encode_body(request: &Request) -> Result<(Option<&'static str>, Bytes), Error> {
    if let Some(state) = request.json_state() {
        let json = match state {
            Ok(value) => value,
            Err(message) => return Err(Error::JsonEncode(message.clone())),
        };
        let bytes =
            serde_json::to_vec(json).map_err(|e| Error::JsonEncode(e.to_string()))?;
        return Ok((Some("application/json"), Bytes::from(bytes)));
    }
    match request.body_ref() {
        Body::Raw(bytes) => Ok((None, bytes.clone())),
        Body::Form(pairs) => {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .finish();
            Ok((
                Some("application/x-www-form-urlencoded"),
                Bytes::from(encoded),
            ))
        }
        Body::Empty => Ok((None, Bytes::new())),
    }
}

/// Assemble the wire-level request: origin-form URI, merged headers,
/// synthesized Host and Cookie headers, Content-Type from body encoding.
fn build_wire_request(
    request: &Request,
    url: &Url,
    content_type: Option<&'static str>,
    payload: Bytes,
) -> Result<http::Request<Full<Bytes>>, Error> {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut wire = http::Request::builder()
        .method(request.method().clone())
        .uri(target)
        .body(Full::new(payload))
        .map_err(|_| Error::InvalidUrl(url.to_string()))?;

    *wire.headers_mut() = request.headers().clone();
    let headers = wire.headers_mut();

    // A caller-supplied Host wins; otherwise derive it per hop so
    // cross-host redirects stay correct.
    if !headers.contains_key(HOST) {
        let host = url.host_str().ok_or_else(|| Error::InvalidUrl(url.to_string()))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&host) {
            headers.insert(HOST, value);
        }
    }

    if !request.cookies().is_empty() {
        let joined = cookie_header_value(request.cookies());
        if let Ok(value) = HeaderValue::from_str(&joined) {
            headers.insert(COOKIE, value);
        }
    }

    if let Some(ct) = content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
    }

    Ok(wire)
}
