//! Concurrent fan-out to every source

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;
use wxagg_core::{PartialObservation, Source};

/// Fetch from every source concurrently, each under its own deadline.
///
/// Results come back in source order. A source that misses the deadline
/// or whose task panics is reported as a failed partial.
pub async fn fetch_all(sources: &[Arc<dyn Source>], timeout: Duration) -> Vec<PartialObservation> {
    let handles: Vec<(String, JoinHandle<Option<PartialObservation>>)> = sources
        .iter()
        .map(|source| {
            let source = Arc::clone(source);
            let id = source.source_id().to_string();
            let handle =
                tokio::spawn(async move { tokio::time::timeout(timeout, source.fetch()).await.ok() });
            (id, handle)
        })
        .collect();

    let mut partials = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        let partial = match handle.await {
            Ok(Some(partial)) => partial,
            Ok(None) => {
                warn!(source = %id, timeout_secs = timeout.as_secs_f64(), "source timed out");
                PartialObservation::failure(id, "Timeout waiting for provider", Utc::now())
            }
            Err(e) => {
                warn!(source = %id, error = %e, "source task failed");
                PartialObservation::failure(id, format!("Fetch task failed: {}", e), Utc::now())
            }
        };
        partials.push(partial);
    }
    partials
}
