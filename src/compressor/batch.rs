//! Bounded fan-out for batch and broadcast calls.
//!
//! Each request runs as its own Tokio task gated by a semaphore sized to the
//! worker pool. Results land in a slot per input index, so the output order
//! never depends on completion order.
//!
//! Under [`BatchPolicy::FailFast`] the first failure is returned immediately
//! and the pool is closed, so requests still waiting for a slot are never
//! sent. Tasks already in flight are detached rather than aborted; whatever
//! they produce is dropped.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::sync::Semaphore;

use super::Endpoint;
use crate::config::BatchPolicy;
use crate::error::{BatchFailure, Result, ScaleDownError};
use crate::types::CompressedPrompt;

/// Pool size for `total` requests: the configured bound, else one worker per request.
pub(crate) fn pool_size(total: usize, max_workers: Option<usize>) -> usize {
    max_workers.unwrap_or(total).clamp(1, total.max(1))
}

pub(crate) async fn run_batch(
    endpoint: &Endpoint,
    bodies: Vec<Value>,
    max_workers: Option<usize>,
    policy: BatchPolicy,
) -> Result<Vec<CompressedPrompt>> {
    let total = bodies.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let workers = pool_size(total, max_workers);
    let permits = Arc::new(Semaphore::new(workers));
    tracing::debug!(requests = total, workers, ?policy, "Dispatching batch");

    let mut pending = FuturesUnordered::new();
    for (index, body) in bodies.into_iter().enumerate() {
        let endpoint = endpoint.clone();
        let permits = Arc::clone(&permits);
        let handle = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ScaleDownError::Transport(format!("worker pool closed: {e}")))?;
            endpoint.send(body).await
        });
        pending.push(async move { (index, handle.await) });
    }

    let mut slots: Vec<Option<CompressedPrompt>> = vec![None; total];
    let mut failures = Vec::new();

    while let Some((index, joined)) = pending.next().await {
        let outcome = match joined {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(prompt) => {
                tracing::debug!(index, "Batch request complete");
                slots[index] = Some(prompt);
            },
            Err(error) => {
                tracing::warn!(index, "Batch request failed: {error}");
                match policy {
                    BatchPolicy::FailFast => {
                        // Queued tasks fail to acquire a slot and never send.
                        permits.close();
                        return Err(error);
                    },
                    BatchPolicy::CollectAll => failures.push(BatchFailure { index, error }),
                }
            },
        }
    }

    if !failures.is_empty() {
        failures.sort_by_key(|f| f.index);
        return Err(ScaleDownError::BatchFailed { total, failures });
    }

    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size() {
        assert_eq!(pool_size(5, None), 5);
        assert_eq!(pool_size(5, Some(2)), 2);
        assert_eq!(pool_size(2, Some(8)), 2);
        assert_eq!(pool_size(3, Some(0)), 1);
        assert_eq!(pool_size(0, None), 1);
    }
}
