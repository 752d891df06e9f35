//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http client, services, checkout flow produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (request counters, retry counters, latency histograms)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → whatever metrics recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - Every request carries a UUID request id through its log events
//! - Metrics go through the `metrics` facade; without a recorder they are no-ops

pub mod logging;
pub mod metrics;
