//! Error taxonomy for request execution.
//!
//! Every failure surfaces as one [`Error`] variant. Variants carry the URL
//! in flight (and status/reason where one exists) so callers can report
//! failures without threading the request around separately.

use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum Error {
    /// The connect phase exceeded its timeout. Safe to retry.
    #[error("connect to {url} timed out after {timeout:?}")]
    ConnectTimeout { url: Url, timeout: Duration },

    /// The read phase (waiting for status line and headers) exceeded its
    /// timeout.
    #[error("read from {url} timed out after {timeout:?}")]
    ReadTimeout { url: Url, timeout: Duration },

    /// Any other I/O failure establishing or using the connection.
    #[error("connection error for {url}: {source}")]
    Connection {
        url: Url,
        #[source]
        source: std::io::Error,
    },

    /// The redirect hop counter exceeded the fixed limit.
    #[error("exceeded {limit} redirects resolving {url}")]
    TooManyRedirects { url: Url, limit: usize },

    /// Raised only by [`Response::error_for_status`](crate::Response::error_for_status)
    /// on a status >= 400; the executor itself returns error responses
    /// normally.
    #[error("HTTP {status}: {reason} for {url}")]
    HttpStatus {
        url: Url,
        status: u16,
        reason: String,
    },

    /// The response body could not be parsed as JSON.
    #[error("failed to decode response body as JSON")]
    JsonDecode(#[source] serde_json::Error),

    /// The caller's JSON payload could not be serialized for the request
    /// body.
    #[error("failed to serialize request body as JSON: {0}")]
    JsonEncode(String),

    /// Malformed URL supplied by the caller or produced by redirect
    /// resolution.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// True for both timeout kinds; the coarse-grained umbrella check.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::ConnectTimeout { .. } | Error::ReadTimeout { .. }
        )
    }

    /// The URL in flight when the failure occurred, if known.
    pub fn url(&self) -> Option<&Url> {
        match self {
            Error::ConnectTimeout { url, .. }
            | Error::ReadTimeout { url, .. }
            | Error::Connection { url, .. }
            | Error::TooManyRedirects { url, .. }
            | Error::HttpStatus { url, .. } => Some(url),
            Error::JsonDecode(_) | Error::JsonEncode(_) | Error::InvalidUrl(_) => None,
        }
    }

    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
