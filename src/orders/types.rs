//! Order wire types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{ScreenOption, SkuData, SkuPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Yape,
    Plin,
    Transferencia,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Yape => "yape",
            PaymentMethod::Plin => "plin",
            PaymentMethod::Transferencia => "transferencia",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yape" => Ok(PaymentMethod::Yape),
            "plin" => Ok(PaymentMethod::Plin),
            "transferencia" => Ok(PaymentMethod::Transferencia),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<u32>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    pub type_plan_id: u64,
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(default)]
    pub promo_code: String,
}

impl CreateOrderRequest {
    /// Order one unit of a resolved plan.
    ///
    /// `screen` is the selected screen option; when absent the plan's own
    /// screen count is used.
    pub fn from_plan(
        sku: &SkuData,
        plan: &SkuPlan,
        screen: Option<&ScreenOption>,
        payment_method: PaymentMethod,
    ) -> Self {
        let type_name = if sku.type_name.is_empty() {
            "Servicio"
        } else {
            sku.type_name.as_str()
        };
        let profiles = screen
            .map(|s| s.screen)
            .filter(|&n| n > 0)
            .or(Some(plan.screen).filter(|&n| n > 0))
            .unwrap_or(1);
        let price = plan.sale_amount().unwrap_or(0.0);
        let duration = if plan.month_content.is_empty() {
            "1 mes".to_string()
        } else {
            plan.month_content.clone()
        };

        Self {
            service_id: sku.service_id(),
            type_plan_id: plan.type_plan_id,
            payment_method,
            items: vec![OrderItem {
                product_id: format!("{}-{}-profile", type_name.to_lowercase(), profiles),
                name: format!("{} {}", type_name, duration),
                quantity: 1,
                price,
                duration: Some(duration),
                profiles: Some(profiles),
            }],
            total: price,
            promo_code: String::new(),
        }
    }
}

/// Server-side order lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Active,
    Paid,
    Expired,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessCredentials {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pin: Option<String>,
}

/// Account access delivered once an order is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessInfo {
    pub account_id: String,
    pub profile_name: String,
    pub slot_number: u32,
    pub access_credentials: AccessCredentials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub transaction_id: String,
    pub payment_method: String,
    #[serde(default)]
    pub paid_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub user_id: String,
    pub out_trade_no: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub plan_name: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(default)]
    pub currency: Option<String>,
    pub order_status: OrderStatus,
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: String,
    #[serde(default)]
    pub ostatus: i32,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub access_info: Option<AccessInfo>,
    #[serde(default)]
    pub payment_info: Option<PaymentInfo>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Order {
    /// A renewal starts at a different time than it was created.
    pub fn is_renewal(&self) -> bool {
        match (&self.created_at, &self.starts_at) {
            (Some(created), Some(starts)) => created != starts,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Pagination {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHistory {
    pub orders: Vec<Order>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub total_orders: u64,
    pub active_orders: u64,
    pub pending_orders: u64,
    pub expired_orders: u64,
    pub total_spent: f64,
}

/// Query filters for the order history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilters {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub order_status: Option<i32>,
    pub out_trade_no: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl HistoryFilters {
    /// Query parameters for the filters that are set.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                params.push((name.to_string(), value));
            }
        };
        push("page", self.page.map(|v| v.to_string()));
        push("limit", self.limit.map(|v| v.to_string()));
        push("order_status", self.order_status.map(|v| v.to_string()));
        push("out_trade_no", self.out_trade_no.clone());
        push("start_time", self.start_time.clone());
        push("end_time", self.end_time.clone());
        params
    }
}

#[cfg(test)]
pub(crate) fn test_order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        customer: "6777c28c3e73d3f1b78b467f".to_string(),
        user_id: "6777c28c3e73d3f1b78b467f".to_string(),
        out_trade_no: format!("T{id}"),
        service_name: "Netflix".to_string(),
        plan_name: "Netflix 1 mes".to_string(),
        items: Vec::new(),
        total: 10.0,
        currency: None,
        order_status: status,
        payment_method: "yape".to_string(),
        ostatus: 0,
        starts_at: None,
        expires_at: None,
        access_info: None,
        payment_info: None,
        created_at: None,
        updated_at: None,
    }
}
