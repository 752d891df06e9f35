//! Metrics collection.
//!
//! # Metrics
//! - `storefront_api_requests_total` (counter): logical calls by method, status, outcome
//! - `storefront_api_request_duration_seconds` (histogram): latency including retries
//! - `storefront_api_retries_total` (counter): retry attempts by method and error kind
//! - `storefront_credentials_cleared_total` (counter): session invalidations

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn metric recording on or off process-wide.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Record a finished logical request.
pub fn record_request(method: &str, status: Option<u16>, outcome: &'static str, start: Instant) {
    if !enabled() {
        return;
    }
    let status = status.map_or_else(|| "none".to_string(), |s| s.to_string());
    metrics::counter!(
        "storefront_api_requests_total",
        "method" => method.to_string(),
        "status" => status,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "storefront_api_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a retry attempt.
pub fn record_retry(method: &str, kind: &'static str) {
    if !enabled() {
        return;
    }
    metrics::counter!(
        "storefront_api_retries_total",
        "method" => method.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record a session invalidation.
pub fn record_credentials_cleared() {
    if !enabled() {
        return;
    }
    metrics::counter!("storefront_credentials_cleared_total").increment(1);
}
