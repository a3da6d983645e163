//! The server's response to an HTTP request.

use crate::error::Error;
use crate::request::Request;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use url::Url;

/// A fully-buffered HTTP response.
///
/// Created once per terminal exchange by the executor and never mutated
/// afterwards. Redirect hops traversed on the way here are recorded in
/// [`history`](Response::history), oldest first; those entries carry
/// status, reason and headers but no body.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    reason: String,
    headers: HeaderMap,
    body: Bytes,
    encoding: String,
    url: Url,
    request: Option<Box<Request>>,
    history: Vec<Response>,
}

impl Response {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, url: Url) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: Bytes::new(),
            encoding: "UTF-8".to_string(),
            url,
            request: None,
            history: Vec::new(),
        }
    }

    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    pub(crate) fn set_history(&mut self, history: Vec<Response>) {
        self.history = history;
    }

    pub(crate) fn set_request(&mut self, request: Request) {
        self.request = Some(Box::new(request));
    }

    /// Detect the text encoding from the `charset=` token of the
    /// Content-Type header. Case-insensitive, trimmed; defaults to UTF-8.
    pub(crate) fn detect_encoding(&mut self) {
        self.encoding = "UTF-8".to_string();
        let Some(content_type) = self.header("content-type") else {
            return;
        };
        for part in content_type.split(';') {
            let part = part.trim();
            if part.len() >= 8 && part.as_bytes()[..8].eq_ignore_ascii_case(b"charset=") {
                self.encoding = part[8..].trim().to_string();
                return;
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Textual reason for the status code. Empty when none is known.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The URL this response was served from (post-redirect).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The request that produced this response. Absent on the
    /// history entries of a redirect chain.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_deref()
    }

    /// Raw body bytes.
    pub fn content(&self) -> &[u8] {
        &self.body
    }

    /// The resolved text encoding label.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Body decoded as text using the detected charset, falling back to
    /// UTF-8 for unknown labels.
    pub fn text(&self) -> String {
        let encoding = encoding_rs::Encoding::for_label(self.encoding.as_bytes())
            .unwrap_or(encoding_rs::UTF_8);
        let (text, _, _) = encoding.decode(&self.body);
        text.into_owned()
    }

    /// Body parsed as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(Error::JsonDecode)
    }

    /// True when the status code is below 400.
    pub fn is_ok(&self) -> bool {
        self.status.as_u16() < 400
    }

    /// Return `self` unchanged for statuses below 400, otherwise an
    /// [`Error::HttpStatus`] embedding the numeric status and reason.
    pub fn error_for_status(&self) -> Result<&Self, Error> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(Error::HttpStatus {
                url: self.url.clone(),
                status: self.status.as_u16(),
                reason: self.reason.clone(),
            })
        }
    }

    /// Redirect responses traversed before this one, oldest first. This
    /// response is never part of its own history.
    pub fn history(&self) -> &[Response] {
        &self.history
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Response [{}]>", self.status.as_u16())
    }
}
