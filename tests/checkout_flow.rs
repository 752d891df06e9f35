//! Plan selection through checkout against a mock backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use common::{config_for, ok, order_payload, sku_payload, MockBackend, RecordedRequest};
use storefront_client::catalog::PlanSelector;
use storefront_client::orders::{
    CheckoutError, CheckoutState, OrderError, OrderIssue, PaymentMethod, Receipt, ReceiptError,
};
use storefront_client::Storefront;

const SKU_PATH: &str = "/api/index/getSkuList";
const ORDERS_PATH: &str = "/api/orders";

/// Routes the catalog, order creation and receipt upload endpoints.
async fn storefront_backend(plans: Vec<(u32, u32, &'static str)>, order_delay: Duration) -> MockBackend {
    MockBackend::start(move |request: RecordedRequest| {
        let plans = plans.clone();
        async move {
            match (request.method.as_str(), request.path.as_str()) {
                ("POST", SKU_PATH) => (200, ok(sku_payload("Netflix", &plans))),
                ("POST", ORDERS_PATH) => {
                    tokio::time::sleep(order_delay).await;
                    let total = request.json()["total"].as_f64().unwrap_or(0.0);
                    (200, ok(order_payload("ord-1", "pending", total)))
                }
                ("PUT", path) if path.ends_with("/comprobante") => {
                    (200, ok(order_payload("ord-1", "paid", 10.0)))
                }
                _ => (404, json!({"message": "not found"}).to_string()),
            }
        }
    })
    .await
}

async fn selector_for(storefront: &Storefront, type_id: u64) -> (storefront_client::catalog::SkuData, PlanSelector) {
    let sku = storefront.sku().sku_list(type_id, "es").await.unwrap();
    let mut selector = PlanSelector::new();
    selector.load_sku(&sku);
    (sku, selector)
}

fn png(size: usize) -> Receipt {
    Receipt::new("pago.png", "image/png", vec![0x89; size])
}

#[tokio::test]
async fn test_select_plan_from_catalog() {
    let backend = storefront_backend(vec![(1, 1, "10"), (1, 2, "18"), (3, 1, "27")], Duration::ZERO).await;
    let storefront = Storefront::init(config_for(&backend.url())).unwrap();

    let (sku, mut selector) = selector_for(&storefront, 7).await;
    assert_eq!(sku.type_name, "Netflix");

    let request = backend.requests().remove(0);
    assert_eq!(request.json()["type_id"], 7);
    assert_eq!(request.json()["language"], "es");

    let plan = selector.current_plan().unwrap();
    assert_eq!((plan.month_id, plan.screen_id), (1, 1));
    assert_eq!(plan.sale_price, "10");

    let plan = selector.select_screen(2).unwrap().unwrap();
    assert_eq!(plan.sale_price, "18");

    // Month 3 has no two-screen plan.
    assert!(selector.select_month(3).unwrap().is_none());
    assert!(!selector.can_pay());
    assert_eq!(selector.select_screen(1).unwrap().unwrap().sale_price, "27");
}

#[tokio::test]
async fn test_checkout_end_to_end() {
    let backend = storefront_backend(vec![(1, 1, "10")], Duration::ZERO).await;
    let storefront = Storefront::init(config_for(&backend.url())).unwrap();
    let (sku, selector) = selector_for(&storefront, 7).await;

    let checkout = storefront.checkout();
    let order = checkout.start(&sku, &selector, PaymentMethod::Yape).await.unwrap();
    assert_eq!(order.id, "ord-1");
    assert!(matches!(checkout.state(), CheckoutState::AwaitingReceipt(_)));
    assert_eq!(storefront.orders().current_order().map(|o| o.id), Some("ord-1".to_string()));

    let created = &backend.requests()[1];
    let body = created.json();
    assert_eq!(body["serviceId"], "66a1f0c2b9e4");
    assert_eq!(body["type_plan_id"], 11);
    assert_eq!(body["paymentMethod"], "yape");
    assert_eq!(body["total"], 10.0);
    assert_eq!(body["items"][0]["quantity"], 1);

    let completed = checkout.upload_receipt(&png(1024)).await.unwrap();
    assert!(matches!(checkout.state(), CheckoutState::Completed(_)));
    assert_eq!(completed.id, "ord-1");

    let upload = &backend.requests()[2];
    assert_eq!(upload.method, "PUT");
    assert_eq!(upload.path, "/api/orders/ord-1/comprobante");
    let content_type = upload.header("content-type").unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let text = upload.body_text();
    assert!(text.contains("name=\"file\"; filename=\"pago.png\""));
    assert!(text.contains("name=\"paymentReference\""));
    assert!(text.contains("Tord-1"));

    // A completed flow refuses further uploads.
    assert!(matches!(
        checkout.upload_receipt(&png(10)).await,
        Err(CheckoutError::Completed)
    ));
    assert_eq!(backend.hits(), 3);
}

#[tokio::test]
async fn test_invalid_receipts_send_nothing() {
    let backend = storefront_backend(vec![(1, 1, "10")], Duration::ZERO).await;
    let storefront = Storefront::init(config_for(&backend.url())).unwrap();
    let (sku, selector) = selector_for(&storefront, 7).await;

    let checkout = storefront.checkout();
    checkout.start(&sku, &selector, PaymentMethod::Plin).await.unwrap();
    let hits = backend.hits();

    let too_large = checkout.upload_receipt(&png(6 * 1024 * 1024)).await;
    assert!(matches!(
        too_large,
        Err(CheckoutError::Order(OrderError::Receipt(ReceiptError::TooLarge { .. })))
    ));

    let gif = Receipt::new("pago.gif", "image/gif", vec![0x47; 64]);
    assert!(matches!(
        checkout.upload_receipt(&gif).await,
        Err(CheckoutError::Order(OrderError::Receipt(ReceiptError::UnsupportedType(_))))
    ));

    assert_eq!(backend.hits(), hits);
    assert!(matches!(checkout.state(), CheckoutState::AwaitingReceipt(_)));
    assert!(checkout.last_error().is_some());
}

#[tokio::test]
async fn test_zero_total_sends_nothing() {
    let backend = storefront_backend(vec![(1, 1, "0")], Duration::ZERO).await;
    let storefront = Storefront::init(config_for(&backend.url())).unwrap();
    let (sku, selector) = selector_for(&storefront, 7).await;

    let checkout = storefront.checkout();
    match checkout.start(&sku, &selector, PaymentMethod::Yape).await {
        Err(CheckoutError::Order(OrderError::Invalid(issues))) => {
            assert!(issues.contains(&OrderIssue::NonPositiveTotal));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(checkout.state(), CheckoutState::NoOrder);
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_cancel_discards_late_order() {
    let backend = storefront_backend(vec![(1, 1, "10")], Duration::from_millis(300)).await;
    let storefront = Storefront::init(config_for(&backend.url())).unwrap();
    let (sku, selector) = selector_for(&storefront, 7).await;

    let checkout = Arc::new(storefront.checkout());
    let flow = checkout.clone();
    let pending = tokio::spawn(async move { flow.start(&sku, &selector, PaymentMethod::Yape).await });

    while backend.hits() < 2 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(checkout.state(), CheckoutState::Creating);
    checkout.cancel().unwrap();

    assert!(matches!(pending.await.unwrap(), Err(CheckoutError::Stale)));
    assert_eq!(checkout.state(), CheckoutState::NoOrder);
    assert_eq!(checkout.generation(), 1);
    // The late order never becomes the current order.
    assert!(storefront.orders().current_order().is_none());
}

#[tokio::test]
async fn test_completed_flow_cannot_be_cancelled() {
    let backend = storefront_backend(vec![(1, 1, "10")], Duration::ZERO).await;
    let storefront = Storefront::init(config_for(&backend.url())).unwrap();
    let (sku, selector) = selector_for(&storefront, 7).await;

    let checkout = storefront.checkout();
    checkout.start(&sku, &selector, PaymentMethod::Yape).await.unwrap();
    checkout.upload_receipt(&png(1024)).await.unwrap();
    let hits = backend.hits();

    assert!(matches!(checkout.cancel(), Err(CheckoutError::Completed)));
    assert!(matches!(checkout.state(), CheckoutState::Completed(_)));
    assert_eq!(checkout.generation(), 0);
    assert_eq!(storefront.orders().current_order().map(|o| o.id), Some("ord-1".to_string()));

    // No second order can be placed from the same flow.
    assert!(matches!(
        checkout.start(&sku, &selector, PaymentMethod::Yape).await,
        Err(CheckoutError::Completed)
    ));
    assert_eq!(backend.hits(), hits);
}

#[tokio::test]
async fn test_failed_order_returns_to_no_order() {
    let backend = MockBackend::start(|request: RecordedRequest| async move {
        if request.path == SKU_PATH {
            (200, ok(sku_payload("Netflix", &[(1, 1, "10")])))
        } else {
            (200, common::rejected(2001, "Stock agotado"))
        }
    })
    .await;
    let storefront = Storefront::init(config_for(&backend.url())).unwrap();
    let (sku, selector) = selector_for(&storefront, 7).await;

    let checkout = storefront.checkout();
    let err = checkout
        .start(&sku, &selector, PaymentMethod::Transferencia)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Stock agotado"));
    assert_eq!(checkout.state(), CheckoutState::NoOrder);
    assert!(checkout.last_error().unwrap().contains("Stock agotado"));
    assert!(storefront.orders().current_order().is_none());
}
