//! Orders, payment receipts and the checkout flow.
//!
//! # Data Flow
//! ```text
//! PlanSelector::current_plan
//!     → CreateOrderRequest::from_plan (types.rs)
//!     → validate_order (validation.rs), nothing sent on failure
//!     → OrderService::create_order (service.rs) → current order store
//!     → Receipt → validate_receipt → OrderService::attach_receipt
//!
//! CheckoutFlow (checkout.rs) drives the two requests as one state machine.
//! History rows are grouped into tabs by history.rs.
//! ```

pub mod checkout;
pub mod history;
pub mod service;
pub mod types;
pub mod validation;

pub use checkout::{CheckoutError, CheckoutFlow, CheckoutState};
pub use history::{filter_orders, OrderTab, TabCounts};
pub use service::{OrderError, OrderService};
pub use types::{
    CreateOrderRequest, HistoryFilters, Order, OrderHistory, OrderItem, OrderStatistics, OrderStatus,
    PaymentMethod,
};
pub use validation::{validate_order, validate_receipt, OrderIssue, Receipt, ReceiptError};
