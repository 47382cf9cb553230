//! The ScaleDown compressor façade.
//!
//! # Request flow
//!
//! ```text
//! compress(context, prompt, options)
//!     │
//!     ├─ effective API key? ── no ──> Authentication (nothing sent)
//!     │
//!     ├─ Dispatch::resolve ── length mismatch ──> InvalidInput
//!     │
//!     ├─ Single ───────────> one POST, awaited inline
//!     └─ Batch / Broadcast ─> N POSTs on a bounded worker pool,
//!                             results slotted back by input index
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use scaledown::{ScaleDownCompressor, ScaleDownOptions};
//!
//! let compressor = ScaleDownCompressor::new(Some("sk-...".into()), "gpt-4o", None)?;
//! let result = compressor
//!     .compress_one("Long context", "Question", &ScaleDownOptions::default())
//!     .await?;
//! println!("{} -> {} tokens", result.original_token_count(), result.compressed_token_count());
//! ```

mod batch;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::{self, BatchPolicy, Config};
use crate::error::{Result, ScaleDownError};
use crate::input::{Dispatch, PromptInput};
use crate::options::ScaleDownOptions;
use crate::transport::{HttpResponse, HttpTransport, Transport};
use crate::types::{ApiResponse, CompressOutput, CompressedPrompt};

/// Request body sent to the compression endpoint.
#[derive(Debug, Serialize)]
struct CompressionRequest<'a> {
    context: &'a str,
    prompt: &'a str,
    model: &'a str,
    scaledown: &'a Value,
}

/// Client for the ScaleDown compression API.
pub struct ScaleDownCompressor {
    api_key: Option<String>,
    target_model: String,
    api_url: String,
    max_workers: Option<usize>,
    batch_policy: BatchPolicy,
    transport: Arc<dyn Transport>,
}

impl ScaleDownCompressor {
    /// Create a compressor. `api_key` falls back to the process-wide key at
    /// call time; `api_url` falls back to [`config::get_api_url`] now.
    pub fn new(
        api_key: Option<String>,
        target_model: impl Into<String>,
        api_url: Option<String>,
    ) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(Config::default().timeout_secs))?;
        Ok(Self {
            api_key,
            target_model: target_model.into(),
            api_url: api_url.unwrap_or_else(config::get_api_url),
            max_workers: None,
            batch_policy: BatchPolicy::default(),
            transport: Arc::new(transport),
        })
    }

    /// Create a compressor from a [`Config`]
    pub fn from_config(settings: &Config) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(settings.timeout_secs))?;
        Ok(Self {
            api_key: settings.api_key.clone(),
            target_model: settings.target_model.clone(),
            api_url: settings.api_url.clone().unwrap_or_else(config::get_api_url),
            max_workers: settings.max_workers,
            batch_policy: settings.batch_policy,
            transport: Arc::new(transport),
        })
    }

    /// Replace the transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Bound the number of concurrent batch requests (minimum 1)
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers.max(1));
        self
    }

    /// Set batch failure handling
    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.batch_policy = policy;
        self
    }

    /// Replace the instance API key. `None` defers to the process-wide key.
    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key;
    }

    /// Instance API key, if one was given
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Target model sent with every request
    pub fn target_model(&self) -> &str {
        &self.target_model
    }

    /// Endpoint requests are posted to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Worker pool bound, if set
    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    /// Batch failure handling
    pub fn batch_policy(&self) -> BatchPolicy {
        self.batch_policy
    }

    /// Key a request would use right now: instance key, else process-wide key.
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(config::get_api_key)
    }

    /// JSON body for one `(context, prompt)` pair.
    pub fn build_payload(
        &self,
        context: &str,
        prompt: &str,
        options: &ScaleDownOptions,
    ) -> Result<Value> {
        self.payload_with(context, prompt, &options.to_value()?)
    }

    fn payload_with(&self, context: &str, prompt: &str, scaledown: &Value) -> Result<Value> {
        Ok(serde_json::to_value(CompressionRequest {
            context,
            prompt,
            model: &self.target_model,
            scaledown,
        })?)
    }

    /// Compress scalar or list inputs.
    ///
    /// Scalars return [`CompressOutput::Single`]. Two equal-length lists, or a
    /// list and a scalar (broadcast), return [`CompressOutput::Batch`] in input
    /// order. Batch requests are spawned on the current Tokio runtime.
    pub async fn compress(
        &self,
        context: impl Into<PromptInput>,
        prompt: impl Into<PromptInput>,
        options: &ScaleDownOptions,
    ) -> Result<CompressOutput> {
        let endpoint = self.endpoint()?;
        let dispatch = Dispatch::resolve(context.into(), prompt.into())?;
        let scaledown = options.to_value()?;

        match dispatch {
            Dispatch::Single { context, prompt } => self
                .compress_single(&endpoint, &context, &prompt, &scaledown)
                .await
                .map(CompressOutput::Single),
            plan => {
                tracing::debug!(
                    requests = plan.len(),
                    broadcast = matches!(plan, Dispatch::Broadcast { .. }),
                    "Compressing batch"
                );
                let bodies = plan
                    .into_pairs()
                    .iter()
                    .map(|(context, prompt)| self.payload_with(context, prompt, &scaledown))
                    .collect::<Result<Vec<_>>>()?;
                batch::run_batch(&endpoint, bodies, self.max_workers, self.batch_policy)
                    .await
                    .map(CompressOutput::Batch)
            },
        }
    }

    /// Compress one `(context, prompt)` pair.
    pub async fn compress_one(
        &self,
        context: &str,
        prompt: &str,
        options: &ScaleDownOptions,
    ) -> Result<CompressedPrompt> {
        let endpoint = self.endpoint()?;
        self.compress_single(&endpoint, context, prompt, &options.to_value()?)
            .await
    }

    /// Fails with `Authentication` when no key is available; nothing is sent.
    fn endpoint(&self) -> Result<Endpoint> {
        let api_key = self
            .effective_api_key()
            .ok_or_else(ScaleDownError::missing_api_key)?;
        Ok(Endpoint::new(
            Arc::clone(&self.transport),
            &self.api_url,
            &api_key,
        ))
    }

    async fn compress_single(
        &self,
        endpoint: &Endpoint,
        context: &str,
        prompt: &str,
        scaledown: &Value,
    ) -> Result<CompressedPrompt> {
        tracing::debug!(
            model = %self.target_model,
            transport = self.transport.name(),
            "Compressing single prompt"
        );
        let body = self.payload_with(context, prompt, scaledown)?;
        endpoint
            .send(body)
            .await
            .inspect_err(|e| tracing::warn!("Compression request failed: {e}"))
    }
}

impl fmt::Debug for ScaleDownCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaleDownCompressor")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("target_model", &self.target_model)
            .field("api_url", &self.api_url)
            .field("max_workers", &self.max_workers)
            .field("batch_policy", &self.batch_policy)
            .field("transport", &self.transport.name())
            .finish()
    }
}

/// Everything a single request needs, cheap to clone into worker tasks.
#[derive(Clone)]
pub(crate) struct Endpoint {
    transport: Arc<dyn Transport>,
    url: Arc<str>,
    api_key: Arc<str>,
}

impl Endpoint {
    fn new(transport: Arc<dyn Transport>, url: &str, api_key: &str) -> Self {
        Self {
            transport,
            url: Arc::from(url),
            api_key: Arc::from(api_key),
        }
    }

    /// POST one body and turn the reply into a result.
    pub(crate) async fn send(&self, body: Value) -> Result<CompressedPrompt> {
        let response = self
            .transport
            .post_json(&self.url, &self.api_key, &body)
            .await?;
        parse_response(response)
    }
}

fn parse_response(response: HttpResponse) -> Result<CompressedPrompt> {
    if !response.is_success() {
        return Err(ScaleDownError::from_status(response.status, response.body));
    }

    let raw: ApiResponse = serde_json::from_str(&response.body)
        .map_err(|e| ScaleDownError::MalformedResponse(format!("{e}: {}", response.body)))?;
    tracing::debug!(
        original = raw.results.original_prompt_tokens,
        compressed = raw.results.compressed_prompt_tokens,
        latency_ms = raw.latency_ms,
        "Compression complete"
    );
    Ok(CompressedPrompt::from_api_response(
        raw.results.compressed_prompt.clone(),
        &raw,
    ))
}
