//! Transport layer abstraction for the ScaleDown client.
//!
//! The compressor never talks to `reqwest` directly; it hands a JSON body to a
//! [`Transport`] and interprets the status and body that come back.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          ScaleDownCompressor            │
//! │  (payloads, dispatch, error mapping)    │
//! └──────────────────┬──────────────────────┘
//!                    │ post_json(url, key, body)
//!          ┌────────┴────────┐
//!          ▼                 ▼
//! ┌─────────────────┐ ┌─────────────────┐
//! │  HttpTransport  │ │  in-memory fake │
//! │   (reqwest)     │ │    (tests)      │
//! └─────────────────┘ └─────────────────┘
//! ```

mod http;

pub use http::HttpTransport;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::Result;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Status and raw body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Undecoded response body
    pub body: String,
}

impl HttpResponse {
    /// Build a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Future returned by [`Transport::post_json`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>>;

/// Transport trait for pluggable HTTP backends.
///
/// Implementations send `body` as JSON with the `x-api-key` and
/// `Content-Type: application/json` headers. Any HTTP status is a successful
/// transport result; only failures to obtain a response are errors.
pub trait Transport: Send + Sync {
    /// POST `body` to `url` authenticated with `api_key`.
    fn post_json<'a>(&'a self, url: &'a str, api_key: &'a str, body: &'a Value)
        -> TransportFuture<'a>;

    /// Get the transport name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(401, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
