//! `reqwest`-backed transport.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;

use super::{HttpResponse, Transport, TransportFuture, API_KEY_HEADER};
use crate::error::{Result, ScaleDownError};

/// HTTPS transport over a shared `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with a per-request timeout (must be non-zero)
    pub fn new(timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(ScaleDownError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scaledown-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScaleDownError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        api_key: &'a str,
        body: &'a Value,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .header(API_KEY_HEADER, api_key)
                .header(CONTENT_TYPE, "application/json")
                .json(body)
                .send()
                .await?;

            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }

    fn name(&self) -> &'static str {
        "HTTP"
    }
}
