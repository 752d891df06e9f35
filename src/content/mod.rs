//! Page content and product listing.
//!
//! # Data Flow
//! ```text
//! ContentService::fetch_sections (service.rs)
//!     → POST {key[], language}
//!     → ContentSection per key, params substituted (types.rs)
//!     → per-language cache + published ContentSnapshot
//!     → header_items(section) → HeaderItem { target: Route | External | Action }
//!
//! ContentService::products (service.rs) → ProductCatalog (products.rs)
//! ```

pub mod products;
pub mod service;
pub mod types;

pub use products::{ClassifyTab, ProductCatalog, ProductCategory, StreamingProduct};
pub use service::{ContentService, DEFAULT_SECTIONS};
pub use types::{header_items, ContentSection, ContentSnapshot, HeaderAction, HeaderItem, MainPage, NavTarget};
