//! Product plans: SKU catalog, month/screen selection.
//!
//! # Data Flow
//! ```text
//! SkuService::sku_list (service.rs)
//!     → SkuData { plan, repayment } (types.rs)
//!     → PlanSelector::load_sku (selection.rs)
//!     → select_month / select_screen → current_plan
//!     → orders::CreateOrderRequest::from_plan
//! ```

pub mod selection;
pub mod service;
pub mod types;

pub use selection::{resolve, PlanSelector, SelectionError, SelectionState};
pub use service::SkuService;
pub use types::{CatalogMismatch, MismatchReason, MonthOption, PlanCatalog, ScreenOption, SkuData, SkuPlan};
