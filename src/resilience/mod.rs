//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Logical API call:
//!     → timeouts.rs (every attempt runs under a deadline)
//!     → On failure: retries.rs (terminal statuses stop immediately)
//!     → backoff.rs (1s, 2s, 4s ... before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - 401, 403 and 404 are never retried
//! - Retries sleep on the Tokio timer, never spin

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::calculate_backoff;
pub use retries::{is_retryable, RetryPolicy};
pub use timeouts::{enforce_deadline, DeadlineElapsed};
