//! Response model and the [`CompressedPrompt`] result type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body returned by the compression endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    /// Per-request compression output
    pub results: ApiResults,
    /// Service-side processing time
    #[serde(default)]
    pub latency_ms: f64,
    /// Model the service compressed for
    #[serde(default)]
    pub model_used: String,
    /// Free-form metadata (timestamps, request ids)
    #[serde(default)]
    pub request_metadata: Map<String, Value>,
}

/// The nested `results` object of [`ApiResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResults {
    /// Compressed prompt text
    pub compressed_prompt: String,
    /// Token count before compression
    #[serde(default)]
    pub original_prompt_tokens: u64,
    /// Token count after compression
    #[serde(default)]
    pub compressed_prompt_tokens: u64,
}

/// A compressed prompt and its metrics.
///
/// Only built through [`CompressedPrompt::from_api_response`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressedPrompt {
    compressed_content: String,
    original_token_count: u64,
    compressed_token_count: u64,
    latency_ms: f64,
    model_used: String,
    metadata: Map<String, Value>,
}

impl CompressedPrompt {
    /// Flatten a service response into a result. Values are copied as-is.
    pub fn from_api_response(content: impl Into<String>, raw_response: &ApiResponse) -> Self {
        Self {
            compressed_content: content.into(),
            original_token_count: raw_response.results.original_prompt_tokens,
            compressed_token_count: raw_response.results.compressed_prompt_tokens,
            latency_ms: raw_response.latency_ms,
            model_used: raw_response.model_used.clone(),
            metadata: raw_response.request_metadata.clone(),
        }
    }

    /// Compressed text
    pub fn compressed_content(&self) -> &str {
        &self.compressed_content
    }

    /// Tokens before compression
    pub fn original_token_count(&self) -> u64 {
        self.original_token_count
    }

    /// Tokens after compression
    pub fn compressed_token_count(&self) -> u64 {
        self.compressed_token_count
    }

    /// Service latency in milliseconds
    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    /// Model reported by the service
    pub fn model_used(&self) -> &str {
        &self.model_used
    }

    /// Request metadata reported by the service
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Tokens removed (zero if compression grew the prompt)
    pub fn tokens_saved(&self) -> u64 {
        self.original_token_count
            .saturating_sub(self.compressed_token_count)
    }

    /// Compressed / original token ratio
    pub fn compression_ratio(&self) -> f64 {
        if self.original_token_count == 0 {
            1.0
        } else {
            self.compressed_token_count as f64 / self.original_token_count as f64
        }
    }

    /// Token savings percentage
    pub fn savings_percent(&self) -> f64 {
        if self.original_token_count == 0 {
            0.0
        } else {
            self.tokens_saved() as f64 / self.original_token_count as f64 * 100.0
        }
    }
}

impl fmt::Display for CompressedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compressed_content)
    }
}

/// What a `compress` call returns: one result for scalar inputs, an ordered
/// list for batch and broadcast inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum CompressOutput {
    /// Scalar context and prompt
    Single(CompressedPrompt),
    /// One result per input position
    Batch(Vec<CompressedPrompt>),
}

impl CompressOutput {
    /// The single result, if this was a scalar call.
    pub fn into_single(self) -> Option<CompressedPrompt> {
        match self {
            CompressOutput::Single(prompt) => Some(prompt),
            CompressOutput::Batch(_) => None,
        }
    }

    /// All results in input order.
    pub fn into_vec(self) -> Vec<CompressedPrompt> {
        match self {
            CompressOutput::Single(prompt) => vec![prompt],
            CompressOutput::Batch(prompts) => prompts,
        }
    }

    /// Number of results
    pub fn len(&self) -> usize {
        match self {
            CompressOutput::Single(_) => 1,
            CompressOutput::Batch(prompts) => prompts.len(),
        }
    }

    /// True for an empty batch
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for batch/broadcast calls
    pub fn is_batch(&self) -> bool {
        matches!(self, CompressOutput::Batch(_))
    }
}

/// Totals across a set of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompressionSummary {
    /// Number of results
    pub requests: usize,
    /// Sum of original token counts
    pub original_tokens: u64,
    /// Sum of compressed token counts
    pub compressed_tokens: u64,
    /// Mean service latency
    pub mean_latency_ms: f64,
}

impl CompressionSummary {
    /// Aggregate a batch of results
    pub fn from_results(results: &[CompressedPrompt]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let total_latency: f64 = results.iter().map(CompressedPrompt::latency_ms).sum();
        Self {
            requests: results.len(),
            original_tokens: results.iter().map(|r| r.original_token_count).sum(),
            compressed_tokens: results.iter().map(|r| r.compressed_token_count).sum(),
            mean_latency_ms: total_latency / results.len() as f64,
        }
    }

    /// Total tokens removed
    pub fn tokens_saved(&self) -> u64 {
        self.original_tokens.saturating_sub(self.compressed_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> ApiResponse {
        serde_json::from_value(json!({
            "results": {
                "compressed_prompt": "Shortened text",
                "original_prompt_tokens": 100,
                "compressed_prompt_tokens": 50
            },
            "latency_ms": 120,
            "model_used": "gpt-4o",
            "request_metadata": {"timestamp": "2025-01-01T12:00:00Z"}
        }))
        .unwrap()
    }

    #[test]
    fn test_from_api_response_copies_fields() {
        let raw = sample_response();
        let prompt = CompressedPrompt::from_api_response(raw.results.compressed_prompt.clone(), &raw);

        assert_eq!(prompt.compressed_content(), "Shortened text");
        assert_eq!(prompt.original_token_count(), 100);
        assert_eq!(prompt.compressed_token_count(), 50);
        assert!((prompt.latency_ms() - 120.0).abs() < f64::EPSILON);
        assert_eq!(prompt.model_used(), "gpt-4o");
        assert_eq!(
            prompt.metadata().get("timestamp"),
            Some(&json!("2025-01-01T12:00:00Z"))
        );
        assert_eq!(prompt.to_string(), "Shortened text");
    }

    #[test]
    fn test_metrics() {
        let prompt = CompressedPrompt::from_api_response("x", &sample_response());
        assert_eq!(prompt.tokens_saved(), 50);
        assert!((prompt.compression_ratio() - 0.5).abs() < 1e-9);
        assert!((prompt.savings_percent() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_optional_fields_default() {
        let raw: ApiResponse =
            serde_json::from_value(json!({"results": {"compressed_prompt": "ok"}})).unwrap();
        let prompt = CompressedPrompt::from_api_response("ok", &raw);
        assert_eq!(prompt.original_token_count(), 0);
        assert!((prompt.compression_ratio() - 1.0).abs() < f64::EPSILON);
        assert!(prompt.metadata().is_empty());
    }

    #[test]
    fn test_missing_results_is_an_error() {
        let raw = serde_json::from_value::<ApiResponse>(json!({"latency_ms": 3}));
        assert!(raw.is_err());
    }

    #[test]
    fn test_output_accessors() {
        let prompt = CompressedPrompt::from_api_response("a", &sample_response());
        let single = CompressOutput::Single(prompt.clone());
        assert!(!single.is_batch());
        assert_eq!(single.len(), 1);
        assert_eq!(single.into_single(), Some(prompt.clone()));

        let batch = CompressOutput::Batch(vec![prompt.clone(), prompt]);
        assert!(batch.is_batch());
        assert_eq!(batch.clone().into_single(), None);
        assert_eq!(batch.into_vec().len(), 2);
    }

    #[test]
    fn test_summary() {
        let prompt = CompressedPrompt::from_api_response("a", &sample_response());
        let summary = CompressionSummary::from_results(&[prompt.clone(), prompt]);
        assert_eq!(summary.requests, 2);
        assert_eq!(summary.original_tokens, 200);
        assert_eq!(summary.tokens_saved(), 100);
        assert!((summary.mean_latency_ms - 120.0).abs() < 1e-9);

        assert_eq!(CompressionSummary::from_results(&[]), CompressionSummary::default());
    }
}
