//! Shared test fixtures: a recording in-memory transport.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scaledown::transport::{HttpResponse, Transport, TransportFuture};
use scaledown::{Result, ScaleDownCompressor, ScaleDownError};
use serde_json::{json, Value};

/// One observed POST
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub api_key: String,
    pub body: Value,
}

type Handler = dyn Fn(&Value) -> (Duration, Result<HttpResponse>) + Send + Sync;

/// Records every request and answers through a handler.
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
    handler: Box<Handler>,
}

impl RecordingTransport {
    /// Answers every request with a canned success echoing `context|prompt`.
    pub fn echo() -> Arc<Self> {
        Self::with_handler(|body| (Duration::ZERO, Ok(echo_response(body))))
    }

    pub fn with_handler<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Value) -> (Duration, Result<HttpResponse>) + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            handler: Box::new(handler),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        api_key: &'a str,
        body: &'a Value,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(RecordedCall {
                url: url.to_string(),
                api_key: api_key.to_string(),
                body: body.clone(),
            });
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let (delay, reply) = (self.handler)(body);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);
            reply
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// The service response used throughout the tests.
pub fn mock_api_response() -> Value {
    json!({
        "results": {
            "compressed_prompt": "Shortened text",
            "original_prompt_tokens": 100,
            "compressed_prompt_tokens": 50
        },
        "latency_ms": 120,
        "model_used": "gpt-4o",
        "request_metadata": {"timestamp": "2025-01-01T12:00:00Z"}
    })
}

/// Canned success whose compressed prompt is `"<context>|<prompt>"`.
pub fn echo_response(body: &Value) -> HttpResponse {
    let mut response = mock_api_response();
    response["results"]["compressed_prompt"] = json!(format!(
        "{}|{}",
        body["context"].as_str().unwrap_or_default(),
        body["prompt"].as_str().unwrap_or_default()
    ));
    HttpResponse::new(200, response.to_string())
}

pub fn transport_error(message: &str) -> ScaleDownError {
    ScaleDownError::Transport(message.to_string())
}

/// Compressor with key `test-key-123`, model `gpt-4o`, wired to `transport`.
pub fn compressor(transport: Arc<RecordingTransport>) -> ScaleDownCompressor {
    init_tracing();
    ScaleDownCompressor::new(
        Some("test-key-123".into()),
        "gpt-4o",
        Some(scaledown::config::DEFAULT_API_URL.into()),
    )
    .unwrap()
    .with_transport(transport)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
