//! Order history grouping for display.

use serde::Serialize;

use crate::orders::types::{Order, OrderStatus};

/// History tab an order is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderTab {
    #[default]
    All,
    Processing,
    Completed,
    Dispute,
    Refunded,
    Cancelled,
}

impl OrderTab {
    /// Tab for an order's server status. `All` is never returned.
    pub fn of(status: &OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => OrderTab::Processing,
            OrderStatus::Active | OrderStatus::Paid => OrderTab::Completed,
            OrderStatus::Expired => OrderTab::Cancelled,
            OrderStatus::Unknown => OrderTab::Dispute,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderTab::All => "Todos",
            OrderTab::Processing => "Procesando",
            OrderTab::Completed => "Terminado",
            OrderTab::Dispute => "Pendiente de resolución",
            OrderTab::Refunded => "Reintegrado",
            OrderTab::Cancelled => "Cancelado",
        }
    }

    pub fn contains(&self, order: &Order) -> bool {
        *self == OrderTab::All || *self == OrderTab::of(&order.order_status)
    }
}

/// Number of orders per tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TabCounts {
    pub all: usize,
    pub processing: usize,
    pub completed: usize,
    pub dispute: usize,
    pub refunded: usize,
    pub cancelled: usize,
}

impl TabCounts {
    pub fn count(orders: &[Order]) -> Self {
        let mut counts = TabCounts {
            all: orders.len(),
            ..TabCounts::default()
        };
        for order in orders {
            match OrderTab::of(&order.order_status) {
                OrderTab::Processing => counts.processing += 1,
                OrderTab::Completed => counts.completed += 1,
                OrderTab::Dispute => counts.dispute += 1,
                OrderTab::Refunded => counts.refunded += 1,
                OrderTab::Cancelled => counts.cancelled += 1,
                OrderTab::All => {}
            }
        }
        counts
    }

    pub fn get(&self, tab: OrderTab) -> usize {
        match tab {
            OrderTab::All => self.all,
            OrderTab::Processing => self.processing,
            OrderTab::Completed => self.completed,
            OrderTab::Dispute => self.dispute,
            OrderTab::Refunded => self.refunded,
            OrderTab::Cancelled => self.cancelled,
        }
    }
}

/// Orders in `tab` matching `query` by trade number or service name.
pub fn filter_orders<'a>(orders: &'a [Order], tab: OrderTab, query: &str) -> Vec<&'a Order> {
    let query = query.trim();
    let needle = query.to_lowercase();
    orders
        .iter()
        .filter(|order| tab.contains(order))
        .filter(|order| {
            query.is_empty()
                || order.out_trade_no.contains(query)
                || order.service_name.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::types::test_order;

    fn orders() -> Vec<Order> {
        let mut disney = test_order("4", OrderStatus::Expired);
        disney.service_name = "Disney+".to_string();
        vec![
            test_order("1", OrderStatus::Pending),
            test_order("2", OrderStatus::Active),
            test_order("3", OrderStatus::Paid),
            disney,
            test_order("5", OrderStatus::Unknown),
        ]
    }

    #[test]
    fn test_counts() {
        let counts = TabCounts::count(&orders());
        assert_eq!(
            counts,
            TabCounts {
                all: 5,
                processing: 1,
                completed: 2,
                dispute: 1,
                refunded: 0,
                cancelled: 1,
            }
        );
        assert_eq!(counts.get(OrderTab::Completed), 2);
    }

    #[test]
    fn test_filter_by_tab_and_query() {
        let orders = orders();
        let completed = filter_orders(&orders, OrderTab::Completed, "");
        assert_eq!(completed.len(), 2);

        let disney = filter_orders(&orders, OrderTab::All, "disney");
        assert_eq!(disney.len(), 1);
        assert_eq!(disney[0].id, "4");

        let by_trade_no = filter_orders(&orders, OrderTab::All, "T5");
        assert_eq!(by_trade_no.len(), 1);
        assert!(filter_orders(&orders, OrderTab::Processing, "disney").is_empty());
    }
}
