//! Configuration management.
//!
//! Two layers:
//! - Process-wide defaults: the API key (seeded from `SCALEDOWN_API_KEY`) and
//!   the API URL (`SCALEDOWN_API_URL`, read live). A `.env` file is loaded
//!   before either is first read.
//! - [`Config`]: an explicit, per-compressor configuration loadable from TOML
//!   files and environment variables.
//!
//! Key resolution for a request is: compressor key, else process-wide key.
//! Exactly one key is used; values are never merged.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::RwLock;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScaleDownError};

/// Environment variable seeding the process-wide API key.
pub const API_KEY_ENV: &str = "SCALEDOWN_API_KEY";

/// Environment variable overriding the API URL.
pub const API_URL_ENV: &str = "SCALEDOWN_API_URL";

/// Compression endpoint used when nothing overrides it.
pub const DEFAULT_API_URL: &str = "https://api.scaledown.ai/v1/compress";

/// Target model used when none is given.
pub const DEFAULT_MODEL: &str = "gpt-4o";

lazy_static! {
    static ref DOTENV_LOADED: bool = match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            true
        },
        Err(_) => false,
    };
    static ref API_KEY: RwLock<Option<String>> = RwLock::new(initial_api_key());
}

/// Load `.env` into the environment once per process. Existing variables win;
/// a missing file is the normal case.
fn load_dotenv() {
    lazy_static::initialize(&DOTENV_LOADED);
}

fn initial_api_key() -> Option<String> {
    load_dotenv();
    non_empty(std::env::var(API_KEY_ENV).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Override the process-wide API key. `None` clears it.
pub fn set_api_key(api_key: Option<String>) {
    let mut guard = match API_KEY.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = non_empty(api_key);
}

/// Current process-wide API key.
pub fn get_api_key() -> Option<String> {
    match API_KEY.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// API URL: `SCALEDOWN_API_URL` if set at call time, else [`DEFAULT_API_URL`].
pub fn get_api_url() -> String {
    load_dotenv();
    non_empty(std::env::var(API_URL_ENV).ok()).unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// What a batch does when one of its requests fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Return the first failure; queued requests are never sent.
    #[default]
    FailFast,
    /// Wait for every request and report all failures together.
    CollectAll,
}

impl FromStr for BatchPolicy {
    type Err = ScaleDownError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(Self::FailFast),
            "collect_all" => Ok(Self::CollectAll),
            _ => Err(ScaleDownError::Config(format!("Unknown batch policy: {s}"))),
        }
    }
}

/// Compressor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key; falls back to the process-wide key when unset
    pub api_key: Option<String>,

    /// Endpoint; falls back to [`get_api_url`] when unset
    pub api_url: Option<String>,

    /// Model the compressed prompt is targeted at
    pub target_model: String,

    /// Per-request timeout in seconds; zero is rejected when a compressor is built
    pub timeout_secs: u64,

    /// Worker pool size for batches (default: one worker per request)
    pub max_workers: Option<usize>,

    /// Failure handling for batches
    pub batch_policy: BatchPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            target_model: DEFAULT_MODEL.to_string(),
            timeout_secs: 60,
            max_workers: None,
            batch_policy: BatchPolicy::default(),
        }
    }
}

impl Config {
    /// Default config file location (`<config_dir>/scaledown/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("scaledown").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ScaleDownError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        load_dotenv();
        let mut config = Self::default();

        config.api_key = non_empty(std::env::var(API_KEY_ENV).ok());
        config.api_url = non_empty(std::env::var(API_URL_ENV).ok());

        if let Some(model) = non_empty(std::env::var("SCALEDOWN_MODEL").ok()) {
            config.target_model = model;
        }
        if let Ok(val) = std::env::var("SCALEDOWN_TIMEOUT_SECS") {
            match val.parse() {
                Ok(secs) => config.timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid SCALEDOWN_TIMEOUT_SECS: {val}"),
            }
        }
        if let Ok(val) = std::env::var("SCALEDOWN_MAX_WORKERS") {
            match val.parse() {
                Ok(workers) => config.max_workers = Some(workers),
                Err(_) => tracing::warn!("Ignoring invalid SCALEDOWN_MAX_WORKERS: {val}"),
            }
        }
        if let Ok(val) = std::env::var("SCALEDOWN_BATCH_POLICY") {
            match val.parse() {
                Ok(policy) => config.batch_policy = policy,
                Err(e) => tracing::warn!("{e}"),
            }
        }

        config
    }

    /// Default file (if present) overlaid with environment variables
    pub fn load() -> Result<Self> {
        let base = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        Ok(base.merge(Self::from_env()))
    }

    /// Merge with another config (other takes precedence where it differs from defaults)
    pub fn merge(self, other: Self) -> Self {
        let defaults = Self::default();
        Self {
            api_key: other.api_key.or(self.api_key),
            api_url: other.api_url.or(self.api_url),
            target_model: if other.target_model == defaults.target_model {
                self.target_model
            } else {
                other.target_model
            },
            timeout_secs: if other.timeout_secs == defaults.timeout_secs {
                self.timeout_secs
            } else {
                other.timeout_secs
            },
            max_workers: other.max_workers.or(self.max_workers),
            batch_policy: if other.batch_policy == defaults.batch_policy {
                self.batch_policy
            } else {
                other.batch_policy
            },
        }
    }
}
