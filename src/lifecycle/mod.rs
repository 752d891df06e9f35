//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Storefront::init (app.rs):
//!     Load config → credentials → API client → services
//!
//! Timers (timers.rs):
//!     spawn_interval → TimerGuard owns the task
//!     guard dropped OR lifetime disposed → task stops
//!
//! Storefront::dispose (shutdown.rs):
//!     Lifetime::dispose → every timer observes it and exits
//! ```
//!
//! # Design Decisions
//! - A timer has exactly one owner; dropping the owner cancels it
//! - Disposal is idempotent

pub mod shutdown;
pub mod timers;

pub use shutdown::Lifetime;
pub use timers::{spawn_interval, Countdown, TimerGuard};
