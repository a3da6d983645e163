//! Credential strategies applied to outgoing requests.
//!
//! A small closed set of variants dispatched through [`Auth::apply`]. The
//! executor invokes `apply` once per physical attempt, before headers are
//! finalized; body encoding runs afterwards, so an implementation must not
//! rely on Content-Type being present yet.

use crate::request::Request;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// HTTP Basic authentication (RFC 7617).
    Basic { username: String, password: String },
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Mutate the request to inject credentials.
    pub fn apply(&self, request: &mut Request) {
        match self {
            Auth::Basic { username, password } => {
                let credentials = format!("{}:{}", username, password);
                let encoded = STANDARD.encode(credentials.as_bytes());
                if let Ok(value) =
                    http::HeaderValue::from_str(&format!("Basic {}", encoded))
                {
                    request
                        .headers_mut()
                        .insert(http::header::AUTHORIZATION, value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header_value() {
        let mut req = Request::get("http://example.com");
        Auth::basic("user", "passwd").apply(&mut req);
        assert_eq!(
            req.headers().get(http::header::AUTHORIZATION).unwrap(),
            "Basic dXNlcjpwYXNzd2Q="
        );
    }

    #[test]
    fn test_apply_overwrites_previous_value() {
        let mut req = Request::get("http://example.com");
        Auth::basic("a", "b").apply(&mut req);
        Auth::basic("user", "passwd").apply(&mut req);
        assert_eq!(
            req.headers()
                .get_all(http::header::AUTHORIZATION)
                .iter()
                .count(),
            1
        );
        assert_eq!(
            req.headers().get(http::header::AUTHORIZATION).unwrap(),
            "Basic dXNlcjpwYXNzd2Q="
        );
    }
}
