//! # ScaleDown - Prompt Compression Client
//!
//! Client library for the hosted ScaleDown prompt-compression API. Send a
//! context and a prompt (or lists of them) and get back the compressed prompt
//! with token and latency metrics.
//!
//! ## Features
//!
//! - **Single, batch and broadcast calls**: scalars, equal-length lists, or one
//!   list against one scalar
//! - **Bounded parallelism**: batch requests run on a worker pool, results come
//!   back in input order
//! - **Layered configuration**: compressor key, then process-wide key seeded
//!   from `SCALEDOWN_API_KEY` (and `.env`)
//! - **Closed error set**: authentication failures are distinct from API,
//!   transport and decoding failures
//!
//! ## Dispatch
//!
//! | context   | prompt    | requests | returns                        |
//! |-----------|-----------|----------|--------------------------------|
//! | `&str`    | `&str`    | 1        | [`CompressOutput::Single`]     |
//! | N items   | N items   | N        | [`CompressOutput::Batch`]      |
//! | N items   | `&str`    | N        | [`CompressOutput::Batch`]      |
//! | `&str`    | N items   | N        | [`CompressOutput::Batch`]      |
//!
//! ## Wire Format
//!
//! ```text
//! POST https://api.scaledown.ai/v1/compress
//! x-api-key: <key>
//! Content-Type: application/json
//!
//! {"context": "...", "prompt": "...", "model": "gpt-4o",
//!  "scaledown": {"rate": "auto", "preserve_keywords": false}}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scaledown::{ScaleDownCompressor, ScaleDownOptions};
//!
//! let compressor = ScaleDownCompressor::new(None, "gpt-4o", None)?;
//! let options = ScaleDownOptions::default();
//!
//! // One request
//! let result = compressor.compress_one("Long context", "Question", &options).await?;
//! println!("{result} ({:.1}% saved)", result.savings_percent());
//!
//! // Broadcast: one prompt over three contexts
//! let results = compressor
//!     .compress(["c1", "c2", "c3"], "single prompt", &options)
//!     .await?
//!     .into_vec();
//! assert_eq!(results.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`compressor`]: The compressor façade and batch worker pool
//! - [`config`]: Process-wide defaults and file/env configuration
//! - [`input`]: Input shapes and dispatch planning
//! - [`options`]: Compression settings
//! - [`transport`]: HTTP transport abstraction
//! - [`types`]: Response model and result types
//! - [`error`]: Error types and result aliases

pub mod compressor;
pub mod config;
pub mod error;
pub mod input;
pub mod options;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use compressor::ScaleDownCompressor;
pub use config::{get_api_key, get_api_url, set_api_key, BatchPolicy, Config};
pub use error::{BatchFailure, Result, ScaleDownError};
pub use input::{BroadcastSide, Dispatch, PromptInput};
pub use options::{Rate, ScaleDownOptions};
pub use transport::{HttpResponse, HttpTransport, Transport};
pub use types::{ApiResponse, ApiResults, CompressOutput, CompressedPrompt, CompressionSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
