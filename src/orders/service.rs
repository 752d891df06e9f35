//! Order endpoints and the current-order store.

use std::sync::Arc;

use reqwest::Method;
use thiserror::Error;
use tokio::sync::watch;

use crate::config::{CheckoutConfig, EndpointConfig};
use crate::http::{
    ApiClient, ApiError, Envelope, ErrorKind, FilePart, MultipartBody, RequestBody, RequestOptions,
};
use crate::orders::types::{CreateOrderRequest, HistoryFilters, Order, OrderHistory, OrderStatistics};
use crate::orders::validation::{validate_order, validate_receipt, OrderIssue, Receipt, ReceiptError};
use crate::store::Store;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("invalid order: {}", join_issues(.0))]
    Invalid(Vec<OrderIssue>),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn join_issues(issues: &[OrderIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone)]
pub struct OrderService {
    api: ApiClient,
    orders: String,
    history: String,
    statistics: String,
    checkout: CheckoutConfig,
    current: Arc<Store<Option<Order>>>,
}

impl OrderService {
    pub fn new(api: ApiClient, endpoints: &EndpointConfig, checkout: CheckoutConfig) -> Self {
        Self {
            api,
            orders: endpoints.orders.trim_end_matches('/').to_string(),
            history: endpoints.order_history.clone(),
            statistics: endpoints.order_statistics.clone(),
            checkout,
            current: Arc::new(Store::new(None)),
        }
    }

    pub fn checkout_config(&self) -> &CheckoutConfig {
        &self.checkout
    }

    /// Validate and submit a new order. The created order becomes current.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, OrderError> {
        let order = self.submit_order(request).await?;
        self.set_current_order(Some(order.clone()));
        Ok(order)
    }

    /// Validate and submit a new order without touching the current order.
    pub(crate) async fn submit_order(&self, request: &CreateOrderRequest) -> Result<Order, OrderError> {
        validate_order(request).map_err(OrderError::Invalid)?;
        let body = RequestBody::json(request).map_err(|e| {
            ApiError::new(
                ErrorKind::BadRequest,
                "POST",
                &self.api.build_url(&self.orders),
                Some(e.to_string()),
            )
        })?;

        let order: Order = self
            .api
            .call(Method::POST, &self.orders, &body, &RequestOptions::default())
            .await?;

        tracing::info!(
            order_id = %order.id,
            trade_no = %order.out_trade_no,
            total = order.total,
            payment_method = %request.payment_method,
            "Order created"
        );
        Ok(order)
    }

    pub async fn order(&self, id: &str) -> Result<Order, ApiError> {
        self.get(&format!("{}/{}", self.orders, id), RequestOptions::default())
            .await
    }

    /// Upload a payment receipt for order `id`.
    ///
    /// Returns the updated order when the backend sends one back.
    pub async fn attach_receipt(
        &self,
        id: &str,
        receipt: &Receipt,
        payment_reference: Option<&str>,
        payment_amount: Option<f64>,
    ) -> Result<Option<Order>, OrderError> {
        let updated = self
            .upload_receipt(id, receipt, payment_reference, payment_amount)
            .await?;
        if let Some(order) = &updated {
            self.set_current_order(Some(order.clone()));
        }
        Ok(updated)
    }

    /// Upload a payment receipt without touching the current order.
    pub(crate) async fn upload_receipt(
        &self,
        id: &str,
        receipt: &Receipt,
        payment_reference: Option<&str>,
        payment_amount: Option<f64>,
    ) -> Result<Option<Order>, OrderError> {
        validate_receipt(receipt, &self.checkout)?;

        let mut form = MultipartBody::new().file(FilePart {
            field: "file".to_string(),
            file_name: receipt.file_name.clone(),
            mime: receipt.mime.clone(),
            bytes: receipt.bytes.clone(),
        });
        if let Some(reference) = payment_reference.filter(|r| !r.is_empty()) {
            form = form.text("paymentReference", reference);
        }
        if let Some(amount) = payment_amount.filter(|a| *a > 0.0) {
            form = form.text("paymentAmount", amount.to_string());
        }

        let endpoint = format!("{}/{}/comprobante", self.orders, id);
        let envelope: Envelope<Order> = self
            .api
            .envelope(
                Method::PUT,
                &endpoint,
                &RequestBody::Multipart(form),
                &RequestOptions::default(),
            )
            .await?;

        match envelope {
            Envelope::Success { data, .. } => {
                tracing::info!(order_id = %id, bytes = receipt.size(), "Receipt uploaded");
                Ok(data)
            }
            Envelope::Failure { code, message } => {
                tracing::warn!(order_id = %id, code, message = %message, "Receipt rejected");
                Err(OrderError::Api(ApiError::rejected(
                    code,
                    "PUT",
                    &self.api.build_url(&endpoint),
                    Some(message),
                )))
            }
        }
    }

    pub async fn history(&self, filters: &HistoryFilters) -> Result<OrderHistory, ApiError> {
        let mut options = RequestOptions::default();
        options.params = filters.to_params();
        self.get(&self.history, options).await
    }

    pub async fn statistics(&self) -> Result<OrderStatistics, ApiError> {
        self.get(&self.statistics, RequestOptions::default()).await
    }

    pub async fn order_by_trade_no(&self, trade_no: &str) -> Result<Order, ApiError> {
        self.get(
            &format!("{}/trade-no/{}", self.orders, trade_no),
            RequestOptions::default(),
        )
        .await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.api
            .call(Method::GET, endpoint, &RequestBody::Empty, &options)
            .await
    }

    pub fn set_current_order(&self, order: Option<Order>) {
        self.current.set(order);
    }

    pub fn clear_current_order(&self) {
        self.current.set(None);
    }

    pub fn current_order(&self) -> Option<Order> {
        self.current.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Order>> {
        self.current.subscribe()
    }
}
