//! Backend HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! Domain service call
//!     → request.rs (options, body, request attempt id)
//!     → client.rs (URL, headers, deadline, send)
//!         → on failure: resilience::retries decides, backoff sleeps, loop
//!     → envelope.rs (decode {code, message, data} into Envelope<T>)
//!     → error.rs (classify terminal failure into ErrorKind)
//!     → Result<T, ApiError> back to the service
//! ```

pub mod client;
pub mod envelope;
pub mod error;
pub mod request;

pub use client::ApiClient;
pub use envelope::{Envelope, Message};
pub use error::{ApiError, ErrorKind};
pub use request::{FilePart, MultipartBody, RequestAttempt, RequestBody, RequestOptions};
