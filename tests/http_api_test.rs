mod support;

use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use order_service::http;
use order_service::persistence::{InMemoryOrderRepository, OrderRepository};

use support::*;

const TRACEPARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

fn orchestrator_with(
    repo: Arc<InMemoryOrderRepository>,
    inventory: Arc<ScriptedInventory>,
) -> web::Data<order_service::domain::order::OrderOrchestrator> {
    let h = harness(repo, inventory, ScriptedPayment::successful("pay-1"));
    web::Data::new(h.orchestrator)
}

#[actix_web::test]
async fn test_submit_order_returns_completed_envelope() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let app = test::init_service(
        App::new()
            .app_data(orchestrator_with(repo.clone(), ScriptedInventory::available()))
            .configure(http::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/orders")
        .insert_header(("traceparent", TRACEPARENT))
        .insert_header(("x-request-id", "req-7"))
        .set_json(json!({
            "customerId": "c1",
            "items": [{"productId": "A", "quantity": 2, "unitPrice": 10.00}],
            "customerNote": "leave at the door"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["totalAmount"], 20.0);
    assert_eq!(body["traceId"], "0af7651916cd43dd8448eb211c80319c");
    assert_eq!(body["requestId"], "req-7");
    assert_eq!(body["items"][0]["productId"], "A");

    let order_id = body["orderId"].as_str().unwrap();
    assert!(repo.find_by_id(order_id).await.unwrap().is_some());
}

#[actix_web::test]
async fn test_logical_failure_is_still_200() {
    let inventory = ScriptedInventory::available().answer("A", Ok(false));
    let app = test::init_service(
        App::new()
            .app_data(orchestrator_with(Arc::new(InMemoryOrderRepository::new()), inventory))
            .configure(http::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "customerId": "c1",
            "items": [{"productId": "A", "quantity": 1, "unitPrice": 1.50}]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "FAILED");
    assert_eq!(body["message"], "Insufficient inventory");
}

#[actix_web::test]
async fn test_empty_items_rejected_without_side_effects() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let inventory = ScriptedInventory::available();
    let app = test::init_service(
        App::new()
            .app_data(orchestrator_with(repo.clone(), inventory.clone()))
            .configure(http::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({"customerId": "c1", "items": []}))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(!body["violations"].as_array().unwrap().is_empty());

    assert!(repo.order_ids().await.is_empty());
    assert!(inventory.calls().is_empty());
}

#[actix_web::test]
async fn test_out_of_bounds_item_rejected() {
    let app = test::init_service(
        App::new()
            .app_data(orchestrator_with(
                Arc::new(InMemoryOrderRepository::new()),
                ScriptedInventory::available(),
            ))
            .configure(http::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "customerId": "c1",
            "items": [{"productId": "A", "quantity": 0, "unitPrice": 0.001}]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["violations"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_unreadable_json_is_validation_error() {
    let app = test::init_service(
        App::new()
            .app_data(orchestrator_with(
                Arc::new(InMemoryOrderRepository::new()),
                ScriptedInventory::available(),
            ))
            .configure(http::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/orders")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_lookup_found_and_missing() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let app = test::init_service(
        App::new()
            .app_data(orchestrator_with(repo.clone(), ScriptedInventory::available()))
            .configure(http::configure),
    )
    .await;

    let submit = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "customerId": "c1",
            "items": [{"productId": "A", "quantity": 2, "unitPrice": 10.00}]
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, submit).await;
    let order_id = created["orderId"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/orders/{order_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let order: Value = test::read_body_json(resp).await;
    assert_eq!(order["orderId"], order_id.as_str());
    assert_eq!(order["status"], "COMPLETED");
    assert_eq!(order["paymentId"], "pay-1");
    assert_eq!(order["createdBy"], PRINCIPAL);

    let req = test::TestRequest::get().uri("/orders/does-not-exist").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_unrepresentable_line_total_is_validation_error() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let inventory = ScriptedInventory::available();
    let app = test::init_service(
        App::new()
            .app_data(orchestrator_with(repo.clone(), inventory.clone()))
            .configure(http::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({
            "customerId": "c1",
            "items": [{"productId": "A", "quantity": 4000000000u64, "unitPrice": 1e25}]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["violations"][0], "items[0].unitPrice: line total out of range");

    assert!(repo.order_ids().await.is_empty());
    assert!(inventory.calls().is_empty());
}
