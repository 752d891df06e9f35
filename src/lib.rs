//! Storefront client library.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                          Storefront (app)                        │
//!   │                                                                  │
//!   │  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────────────────┐  │
//!   │  │ content │  │ catalog │  │ session │  │       orders        │  │
//!   │  │ service │  │ sku +   │  │  auth + │  │ service + checkout  │  │
//!   │  │         │  │selector │  │  creds  │  │   flow + history    │  │
//!   │  └────┬────┘  └────┬────┘  └────┬────┘  └──────────┬──────────┘  │
//!   │       └────────────┴─────┬──────┴──────────────────┘             │
//!   │                          ▼                                       │
//!   │                 ┌─────────────────┐    ┌──────────────┐          │
//!   │                 │  http::ApiClient│───▶│  resilience  │          │
//!   │                 │ envelope, error │    │ retry/backoff│          │
//!   │                 └────────┬────────┘    └──────────────┘          │
//!   │                          │                                       │
//!   │  ┌──────────┐  ┌─────────┴──┐  ┌────────────┐  ┌──────────────┐  │
//!   │  │  config  │  │   store    │  │ lifecycle  │  │observability │  │
//!   │  └──────────┘  └────────────┘  └────────────┘  └──────────────┘  │
//!   └──────────────────────────┬───────────────────────────────────────┘
//!                              ▼
//!                        Backend REST API
//! ```

pub mod app;
pub mod catalog;
pub mod config;
pub mod content;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orders;
pub mod resilience;
pub mod session;
pub mod store;

pub use app::{Storefront, StorefrontError};
pub use config::ClientConfig;
pub use http::{ApiClient, ApiError, ErrorKind};
