//! Checkout flow: create an order, then upload its payment receipt.
//!
//! # States
//! - NoOrder: nothing in progress
//! - Creating: order request in flight
//! - AwaitingReceipt: order created, waiting for the receipt
//! - UploadingReceipt: receipt upload in flight
//! - Completed: receipt accepted; the flow refuses further changes
//!
//! # State Transitions
//! ```text
//! NoOrder → Creating: start / create (request passed validation)
//! Creating → AwaitingReceipt: order created
//! Creating → NoOrder: request failed (error kept in last_error)
//! AwaitingReceipt → UploadingReceipt: upload (receipt passed validation)
//! UploadingReceipt → Completed: receipt accepted
//! UploadingReceipt → AwaitingReceipt: upload failed (error kept in last_error)
//! any but Completed → NoOrder: cancel()
//! ```
//!
//! # Design Decisions
//! - Every request carries the generation it started in; `cancel()` bumps the
//!   generation so a response arriving afterwards is dropped
//! - The shared current order is written only after the generation check
//! - Validation failures never leave the current state

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;

use crate::catalog::{PlanSelector, SkuData};
use crate::orders::service::{OrderError, OrderService};
use crate::orders::types::{CreateOrderRequest, Order, PaymentMethod};
use crate::orders::validation::{validate_order, validate_receipt, Receipt};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    NoOrder,
    Creating,
    AwaitingReceipt(Order),
    UploadingReceipt(Order),
    Completed(Order),
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::NoOrder => "no_order",
            CheckoutState::Creating => "creating",
            CheckoutState::AwaitingReceipt(_) => "awaiting_receipt",
            CheckoutState::UploadingReceipt(_) => "uploading_receipt",
            CheckoutState::Completed(_) => "completed",
        }
    }

    pub fn order(&self) -> Option<&Order> {
        match self {
            CheckoutState::AwaitingReceipt(order)
            | CheckoutState::UploadingReceipt(order)
            | CheckoutState::Completed(order) => Some(order),
            CheckoutState::NoOrder | CheckoutState::Creating => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, CheckoutState::Creating | CheckoutState::UploadingReceipt(_))
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("no plan available for the current selection")]
    NoPlan,

    #[error("cannot {action} while checkout is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("checkout was cancelled before the response arrived")]
    Stale,

    #[error("checkout is already completed")]
    Completed,

    #[error(transparent)]
    Order(#[from] OrderError),
}

struct Inner {
    generation: u64,
    last_error: Option<String>,
}

/// One checkout session for one order.
pub struct CheckoutFlow {
    orders: OrderService,
    inner: Mutex<Inner>,
    state: Store<CheckoutState>,
}

impl CheckoutFlow {
    pub fn new(orders: OrderService) -> Self {
        Self {
            orders,
            inner: Mutex::new(Inner {
                generation: 0,
                last_error: None,
            }),
            state: Store::new(CheckoutState::NoOrder),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Order the plan currently resolved by `selector`.
    pub async fn start(
        &self,
        sku: &SkuData,
        selector: &PlanSelector,
        payment_method: PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        let plan = selector.current_plan().ok_or(CheckoutError::NoPlan)?;
        let request =
            CreateOrderRequest::from_plan(sku, plan, selector.selected_screen(), payment_method);
        self.create(&request).await
    }

    pub async fn create(&self, request: &CreateOrderRequest) -> Result<Order, CheckoutError> {
        let generation = {
            let mut inner = self.lock();
            self.state.with(|state| match state {
                CheckoutState::NoOrder => Ok(()),
                CheckoutState::Completed(_) => Err(CheckoutError::Completed),
                other => Err(CheckoutError::InvalidState {
                    action: "create an order",
                    state: other.name(),
                }),
            })?;
            if let Err(issues) = validate_order(request) {
                let err = CheckoutError::Order(OrderError::Invalid(issues));
                inner.last_error = Some(err.to_string());
                return Err(err);
            }
            inner.last_error = None;
            self.state.set(CheckoutState::Creating);
            inner.generation
        };

        let result = self.orders.submit_order(request).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(generation, "Discarding order response after cancel");
            return Err(CheckoutError::Stale);
        }
        match result {
            Ok(order) => {
                self.orders.set_current_order(Some(order.clone()));
                self.state.set(CheckoutState::AwaitingReceipt(order.clone()));
                Ok(order)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order creation failed");
                inner.last_error = Some(e.to_string());
                self.state.set(CheckoutState::NoOrder);
                Err(e.into())
            }
        }
    }

    /// Upload the payment receipt for the created order.
    pub async fn upload_receipt(&self, receipt: &Receipt) -> Result<Order, CheckoutError> {
        let (generation, order) = {
            let mut inner = self.lock();
            let order = self.state.with(|state| match state {
                CheckoutState::AwaitingReceipt(order) => Ok(order.clone()),
                CheckoutState::Completed(_) => Err(CheckoutError::Completed),
                other => Err(CheckoutError::InvalidState {
                    action: "upload a receipt",
                    state: other.name(),
                }),
            })?;
            if let Err(e) = validate_receipt(receipt, self.orders.checkout_config()) {
                let err = CheckoutError::Order(e.into());
                inner.last_error = Some(err.to_string());
                return Err(err);
            }
            inner.last_error = None;
            self.state.set(CheckoutState::UploadingReceipt(order.clone()));
            (inner.generation, order)
        };

        let result = self
            .orders
            .upload_receipt(&order.id, receipt, Some(&order.out_trade_no), Some(order.total))
            .await;

        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(generation, order_id = %order.id, "Discarding receipt response after cancel");
            return Err(CheckoutError::Stale);
        }
        match result {
            Ok(updated) => {
                let order = updated.unwrap_or(order);
                tracing::info!(order_id = %order.id, "Checkout completed");
                self.orders.set_current_order(Some(order.clone()));
                self.state.set(CheckoutState::Completed(order.clone()));
                Ok(order)
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Receipt upload failed");
                inner.last_error = Some(e.to_string());
                self.state.set(CheckoutState::AwaitingReceipt(order));
                Err(e.into())
            }
        }
    }

    /// Abandon the flow. Responses still in flight are discarded.
    ///
    /// A completed flow keeps its order and refuses.
    pub fn cancel(&self) -> Result<(), CheckoutError> {
        let mut inner = self.lock();
        if self.state.with(|state| matches!(state, CheckoutState::Completed(_))) {
            return Err(CheckoutError::Completed);
        }
        inner.generation += 1;
        inner.last_error = None;
        self.state.set(CheckoutState::NoOrder);
        self.orders.clear_current_order();
        tracing::debug!(generation = inner.generation, "Checkout cancelled");
        Ok(())
    }

    pub fn state(&self) -> CheckoutState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state.subscribe()
    }

    /// Message for the most recent failure, cleared when a step starts again.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::types::catalog;
    use crate::catalog::PlanCatalog;
    use crate::config::{ApiConfig, CheckoutConfig, EndpointConfig};
    use crate::http::{ApiClient, ErrorKind};
    use crate::orders::types::OrderItem;
    use crate::session::CredentialStore;

    fn flow_against(base_url: &str) -> CheckoutFlow {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            max_retries: 0,
            ..ApiConfig::default()
        };
        let api = ApiClient::new(&config, Arc::new(CredentialStore::default())).unwrap();
        CheckoutFlow::new(OrderService::new(
            api,
            &EndpointConfig::default(),
            CheckoutConfig::default(),
        ))
    }

    fn unreachable_flow() -> CheckoutFlow {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        flow_against(&format!("http://127.0.0.1:{port}"))
    }

    fn request(total: f64) -> CreateOrderRequest {
        CreateOrderRequest {
            service_id: "66a1".to_string(),
            type_plan_id: 11,
            payment_method: PaymentMethod::Yape,
            items: vec![OrderItem {
                product_id: "netflix-1-profile".to_string(),
                name: "Netflix 1 mes".to_string(),
                quantity: 1,
                price: total,
                duration: None,
                profiles: Some(1),
            }],
            total,
            promo_code: String::new(),
        }
    }

    #[tokio::test]
    async fn test_invalid_order_keeps_state() {
        let flow = unreachable_flow();
        let err = flow.create(&request(0.0)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Order(OrderError::Invalid(_))));
        assert_eq!(flow.state(), CheckoutState::NoOrder);
        assert!(flow.last_error().unwrap().contains("total must be greater than 0"));
    }

    #[tokio::test]
    async fn test_failed_create_returns_to_no_order() {
        let flow = unreachable_flow();
        let err = flow.create(&request(10.0)).await.unwrap_err();
        match err {
            CheckoutError::Order(OrderError::Api(api)) => assert_eq!(api.kind, ErrorKind::Network),
            other => panic!("expected network error, got {other:?}"),
        }
        assert_eq!(flow.state(), CheckoutState::NoOrder);
        assert!(flow.last_error().is_some());
    }

    #[tokio::test]
    async fn test_upload_requires_order() {
        let flow = unreachable_flow();
        let receipt = Receipt::new("pago.png", "image/png", vec![1]);
        let err = flow.upload_receipt(&receipt).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InvalidState { state: "no_order", .. }
        ));
    }

    #[tokio::test]
    async fn test_start_without_plan() {
        let flow = unreachable_flow();
        let sku = SkuData {
            id: 5,
            object_id: "66a1".to_string(),
            type_name: "Netflix".to_string(),
            thumb_img: String::new(),
            show_status: 1,
            select_info: String::new(),
            plan: PlanCatalog::default(),
            repayment: None,
        };
        let mut selector = PlanSelector::new();
        selector.load(catalog(&[(1, 1, "10")]));
        selector.select_screen(4).unwrap();

        let err = flow.start(&sku, &selector, PaymentMethod::Yape).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NoPlan));
        assert_eq!(flow.state(), CheckoutState::NoOrder);
    }

    #[test]
    fn test_cancel_bumps_generation() {
        let flow = unreachable_flow();
        let mut rx = flow.subscribe();
        flow.cancel().unwrap();
        flow.cancel().unwrap();
        assert_eq!(flow.generation(), 2);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), CheckoutState::NoOrder);
    }
}
