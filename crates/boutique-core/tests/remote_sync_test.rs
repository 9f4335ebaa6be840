#![allow(clippy::unwrap_used)]

// Remote-session behavior against a mocked remote store.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use boutique_core::{
    AddCategoryRequest, CacheLocation, ChangeEvent, ChangeKind, Controller, CoreError, EntityId,
    Identity, ProductStatus, SessionState, StoreConfig, Table, UpdateSettingsRequest,
};

const CATEGORY_ID: &str = "0d5e7c1b-3a2f-4e6d-8b9c-1f2a3b4c5d6e";
const PRODUCT_ID: &str = "6f1c2a0e-8d4b-4c1e-9f3a-2b7d5e8c1a90";
const SETTINGS_ID: &str = "3c9a1f4e-2b6d-4a8e-9c1f-7e5d3b2a1c0f";
const RESERVATION_ID: &str = "9b2e4d6f-1a3c-4e5b-8d7f-0c2a4e6b8d1f";

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> StoreConfig {
    StoreConfig {
        url: Some(server.uri().parse().unwrap()),
        anon_key: Some(SecretString::from("anon-key")),
        timeout: Duration::from_secs(5),
        realtime_enabled: false,
        cache: CacheLocation::Memory,
        ..StoreConfig::default()
    }
}

fn identity() -> Identity {
    Identity::new("admin", SecretString::from("user-token"))
}

fn category_json() -> Value {
    json!({ "id": CATEGORY_ID, "name": "Dresses", "code": "DRS" })
}

fn product_json(status: &str) -> Value {
    json!({
        "id": PRODUCT_ID,
        "reference": "DRS26-0042",
        "name": "Dress A",
        "price": 100.0,
        "description": "Linen",
        "images": ["1.jpg", "2.jpg", "3.jpg", "4.jpg"],
        "category_id": CATEGORY_ID,
        "status": status,
        "created_at": "2026-03-01T10:00:00Z"
    })
}

fn reservation_json(status: &str) -> Value {
    json!({
        "id": RESERVATION_ID,
        "product_id": PRODUCT_ID,
        "customer_name": "Ana",
        "customer_phone": "+5055",
        "status": status,
        "reservation_date": "2026-03-02T10:00:00Z"
    })
}

fn settings_json() -> Value {
    json!({
        "id": SETTINGS_ID,
        "store_name": "Remote Boutique",
        "logo_url": "/logo.png",
        "slogan": "Hello",
        "whatsapp_number": "+50587010851",
        "exchange_rate": 36.5
    })
}

/// Responds with the request body wrapped in an array, the way the
/// remote store returns inserted rows.
fn echo_row(req: &Request) -> ResponseTemplate {
    let row: Value = serde_json::from_slice(&req.body).unwrap();
    ResponseTemplate::new(201).set_body_json(json!([row]))
}

async fn mount_list(server: &MockServer, table: &str, rows: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{table}")))
        .and(query_param("select", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

/// One category, one available product, no reservations, no settings row.
async fn mount_catalog(server: &MockServer) {
    mount_list(server, "categories", json!([category_json()])).await;
    mount_list(server, "products", json!([product_json("available")])).await;
    mount_list(server, "reservations", json!([])).await;
    mount_list(server, "settings", json!([])).await;
}

async fn remote_controller(server: &MockServer) -> Controller {
    let controller = Controller::new(config(server));
    let mode = controller.start(Some(identity())).await.unwrap();
    assert_eq!(mode, SessionState::Remote);
    controller
}

fn product_id() -> EntityId {
    EntityId::from(PRODUCT_ID.to_owned())
}

// ── Session start ───────────────────────────────────────────────────

#[tokio::test]
async fn start_fetches_all_four_tables_with_credentials() {
    let server = MockServer::start().await;
    for table in ["categories", "products", "reservations", "settings"] {
        let rows = match table {
            "categories" => json!([category_json()]),
            "products" => json!([product_json("available")]),
            "settings" => json!([settings_json()]),
            _ => json!([]),
        };
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{table}")))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .expect(1)
            .mount(&server)
            .await;
    }

    let controller = remote_controller(&server).await;

    assert_eq!(controller.categories_snapshot().len(), 1);
    assert_eq!(
        controller.product_by_id(&product_id()).unwrap().reference,
        "DRS26-0042"
    );
    assert_eq!(controller.settings().store_name, "Remote Boutique");
    assert!(controller.store().last_refresh().is_some());
}

#[tokio::test]
async fn unreachable_remote_falls_back_to_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let controller = Controller::new(config(&server));
    let mode = controller.start(Some(identity())).await.unwrap();
    assert_eq!(mode, SessionState::Remote);
    assert!(controller.products_snapshot().is_empty());
    assert!(controller.store().last_refresh().is_none());
}

#[tokio::test]
async fn signing_in_without_remote_config_is_rejected() {
    let controller = Controller::new(StoreConfig::local(CacheLocation::Memory));
    let err = controller.start(Some(identity())).await.unwrap_err();
    assert!(matches!(err, CoreError::Config { .. }), "{err:?}");
    assert_eq!(*controller.session_state().borrow(), SessionState::Closed);
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn remote_failure_leaves_state_unchanged() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "database is down",
            "code": "XX000"
        })))
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let err = controller
        .add_category(AddCategoryRequest {
            name: "Tops".into(),
            code: "TOP".into(),
        })
        .await
        .unwrap_err();

    match err {
        CoreError::Remote { status, message, .. } => {
            assert_eq!(status, Some(500));
            assert!(message.contains("database is down"), "{message}");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
    assert_eq!(controller.categories_snapshot().len(), 1);
}

#[tokio::test]
async fn remote_insert_is_authoritative() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .respond_with(echo_row)
        .expect(1)
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let category = controller
        .add_category(AddCategoryRequest {
            name: "Tops".into(),
            code: "top".into(),
        })
        .await
        .unwrap();

    assert_eq!(category.code, "TOP");
    assert_eq!(*controller.category_by_id(&category.id).unwrap(), category);
}

#[tokio::test]
async fn reserve_compensates_when_product_update_fails() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reservations"))
        .respond_with(echo_row)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", format!("eq.{PRODUCT_ID}")))
        .and(body_json(json!({ "status": "reserved" })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/reservations"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let err = controller
        .reserve_product(product_id(), "Ana", "+5055")
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Remote { .. }), "{err:?}");
    assert!(controller.reservations_snapshot().is_empty());
    assert_eq!(
        controller.product_by_id(&product_id()).unwrap().status,
        ProductStatus::Available
    );
    assert!(controller.reconciliation_issues().is_empty());
}

#[tokio::test]
async fn failed_compensation_is_reported_for_reconciliation() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reservations"))
        .respond_with(echo_row)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/reservations"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let err = controller
        .reserve_product(product_id(), "Ana", "+5055")
        .await
        .unwrap_err();

    match &err {
        CoreError::CompensationFailed { operation, .. } => {
            assert_eq!(operation, "reserve_product");
        }
        other => panic!("expected CompensationFailed, got {other:?}"),
    }
    assert!(controller.reservations_snapshot().is_empty());

    let issues = controller.reconciliation_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].entity, "reservation");
    assert_eq!(issues[0].operation, "reserve_product");
}

#[tokio::test]
async fn unreadable_product_echo_keeps_the_local_copy() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reservations"))
        .respond_with(echo_row)
        .expect(1)
        .mount(&server)
        .await;
    // Both writes are committed; only the product echo is garbled.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json("Reserved")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/reservations"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    controller
        .reserve_product(product_id(), "Ana", "+5055")
        .await
        .unwrap();
    assert_eq!(
        controller.product_by_id(&product_id()).unwrap().status,
        ProductStatus::Reserved
    );

    let err = controller
        .reserve_product(product_id(), "Luis", "+5056")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }), "{err:?}");
    assert_eq!(controller.reservations_snapshot().len(), 1);
    assert!(controller.reconciliation_issues().is_empty());
}

#[tokio::test]
async fn unreadable_reservation_echo_undoes_the_insert() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reservations"))
        .respond_with(|req: &Request| {
            let mut row: Value = serde_json::from_slice(&req.body).unwrap();
            row["status"] = json!("Pending");
            ResponseTemplate::new(201).set_body_json(json!([row]))
        })
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json("reserved")])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/reservations"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let err = controller
        .reserve_product(product_id(), "Ana", "+5055")
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Remote { .. }), "{err:?}");
    assert!(controller.reservations_snapshot().is_empty());
    assert_eq!(
        controller.product_by_id(&product_id()).unwrap().status,
        ProductStatus::Available
    );
    assert!(controller.reconciliation_issues().is_empty());
}

#[tokio::test]
async fn reserve_then_complete_writes_both_tables() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reservations"))
        .respond_with(echo_row)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservations"))
        .and(body_json(json!({ "status": "completed" })))
        .respond_with(|req: &Request| {
            // Echo back the reservation with its new status.
            let id = req
                .url
                .query_pairs()
                .find(|(k, _)| k == "id")
                .map(|(_, v)| v.trim_start_matches("eq.").to_owned())
                .unwrap();
            ResponseTemplate::new(200).set_body_json(json!([{
                "id": id,
                "product_id": PRODUCT_ID,
                "customer_name": "Ana",
                "customer_phone": "+5055",
                "status": "completed",
                "reservation_date": "2026-03-02T10:00:00Z"
            }]))
        })
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(body_json(json!({ "status": "reserved" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json("reserved")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(body_json(json!({ "status": "sold" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json("sold")])))
        .expect(1)
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let reservation = controller
        .reserve_product(product_id(), "Ana", "+5055")
        .await
        .unwrap();
    assert_eq!(
        controller.product_by_id(&product_id()).unwrap().status,
        ProductStatus::Reserved
    );

    controller
        .complete_reservation(reservation.id.clone())
        .await
        .unwrap();
    assert_eq!(
        controller.product_by_id(&product_id()).unwrap().status,
        ProductStatus::Sold
    );
    assert!(controller.reservation_by_product_id(&product_id()).is_none());
}

#[tokio::test]
async fn cancel_reopens_the_reservation_when_product_update_fails() {
    let server = MockServer::start().await;
    mount_list(&server, "categories", json!([category_json()])).await;
    mount_list(&server, "products", json!([product_json("reserved")])).await;
    mount_list(&server, "reservations", json!([reservation_json("pending")])).await;
    mount_list(&server, "settings", json!([])).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservations"))
        .and(query_param("id", format!("eq.{RESERVATION_ID}")))
        .and(body_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([reservation_json("cancelled")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(body_json(json!({ "status": "available" })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservations"))
        .and(query_param("id", format!("eq.{RESERVATION_ID}")))
        .and(body_json(json!({ "status": "pending" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([reservation_json("pending")])))
        .expect(1)
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let reservation_id = EntityId::from(RESERVATION_ID.to_owned());
    let err = controller
        .cancel_reservation(reservation_id.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Remote { .. }), "{err:?}");
    assert!(
        controller
            .reservation_by_id(&reservation_id)
            .unwrap()
            .is_pending()
    );
    assert_eq!(
        controller.product_by_id(&product_id()).unwrap().status,
        ProductStatus::Reserved
    );
    assert!(controller.reconciliation_issues().is_empty());
}

#[tokio::test]
async fn failed_reopen_after_complete_is_reported_for_reconciliation() {
    let server = MockServer::start().await;
    mount_list(&server, "categories", json!([category_json()])).await;
    mount_list(&server, "products", json!([product_json("reserved")])).await;
    mount_list(&server, "reservations", json!([reservation_json("pending")])).await;
    mount_list(&server, "settings", json!([])).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservations"))
        .and(body_json(json!({ "status": "completed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([reservation_json("completed")])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservations"))
        .and(body_json(json!({ "status": "pending" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let err = controller
        .complete_reservation(EntityId::from(RESERVATION_ID.to_owned()))
        .await
        .unwrap_err();

    match &err {
        CoreError::CompensationFailed { operation, .. } => {
            assert_eq!(operation, "complete_reservation");
        }
        other => panic!("expected CompensationFailed, got {other:?}"),
    }
    let issues = controller.reconciliation_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].operation, "complete_reservation");
    assert_eq!(issues[0].entity, "reservation");
}

// ── Settings ────────────────────────────────────────────────────────

#[tokio::test]
async fn settings_are_inserted_when_no_row_exists() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/settings"))
        .respond_with(|req: &Request| {
            let mut row: Value = serde_json::from_slice(&req.body).unwrap();
            assert!(row.get("id").is_none());
            row["id"] = json!(SETTINGS_ID);
            ResponseTemplate::new(201).set_body_json(json!([row]))
        })
        .expect(1)
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let saved = controller
        .update_settings(UpdateSettingsRequest {
            store_name: Some("New Name".into()),
            ..UpdateSettingsRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(saved.store_name, "New Name");
    assert_eq!(controller.settings(), saved);
}

#[tokio::test]
async fn existing_settings_row_is_updated_in_place() {
    let server = MockServer::start().await;
    mount_list(&server, "categories", json!([])).await;
    mount_list(&server, "products", json!([])).await;
    mount_list(&server, "reservations", json!([])).await;
    mount_list(&server, "settings", json!([settings_json()])).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/settings"))
        .and(query_param("id", format!("eq.{SETTINGS_ID}")))
        .respond_with(|req: &Request| {
            let mut row: Value = serde_json::from_slice(&req.body).unwrap();
            row["id"] = json!(SETTINGS_ID);
            ResponseTemplate::new(200).set_body_json(json!([row]))
        })
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/settings"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let saved = controller
        .update_settings(UpdateSettingsRequest {
            exchange_rate: Some(37.25),
            ..UpdateSettingsRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(saved.store_name, "Remote Boutique");
    assert!((saved.exchange_rate - 37.25).abs() < f64::EPSILON);
}

// ── Timeouts ────────────────────────────────────────────────────────

#[tokio::test]
async fn slow_remote_write_times_out() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let controller = Controller::new(StoreConfig {
        timeout: Duration::from_millis(300),
        ..config(&server)
    });
    controller.start(Some(identity())).await.unwrap();

    let err = controller
        .add_category(AddCategoryRequest {
            name: "Tops".into(),
            code: "TOP".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Timeout { .. }), "{err:?}");
    assert_eq!(controller.categories_snapshot().len(), 1);
}

// ── Change feed ─────────────────────────────────────────────────────

#[tokio::test]
async fn change_event_refetches_the_affected_table() {
    let server = MockServer::start().await;
    mount_list(&server, "categories", json!([category_json()])).await;
    mount_list(&server, "reservations", json!([])).await;
    mount_list(&server, "settings", json!([])).await;
    // First fetch sees the product available, later ones see it sold.
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json("available")])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_list(&server, "products", json!([product_json("sold")])).await;

    let controller = remote_controller(&server).await;
    let mut products = controller.products();
    let mut changes = controller.changes();

    let (tx, rx) = broadcast::channel(16);
    let subscription = controller.attach_change_feed(rx).await;
    assert!(subscription.is_active());

    tx.send(Arc::new(ChangeEvent {
        table: Table::Products,
        kind: ChangeKind::Update,
        record_id: Some(PRODUCT_ID.into()),
        commit_timestamp: None,
    }))
    .unwrap();

    let snap = tokio::time::timeout(Duration::from_secs(5), products.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap[0].status, ProductStatus::Sold);

    let forwarded = tokio::time::timeout(Duration::from_secs(5), changes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(forwarded.table, Table::Products);

    subscription.unsubscribe().await;
    controller.shutdown().await;
}

#[tokio::test]
async fn end_session_stops_an_attached_change_feed() {
    let server = MockServer::start().await;
    mount_list(&server, "categories", json!([category_json()])).await;
    mount_list(&server, "reservations", json!([])).await;
    mount_list(&server, "settings", json!([])).await;
    // Only the fetch from start(); a change after the session ends must
    // not reach the remote store.
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json("available")])))
        .expect(1)
        .mount(&server)
        .await;

    let controller = remote_controller(&server).await;
    let (tx, rx) = broadcast::channel(16);
    let subscription = controller.attach_change_feed(rx).await;
    assert!(subscription.is_active());

    controller.end_session().await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while tx.receiver_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert!(!subscription.is_active());

    let sent = tx.send(Arc::new(ChangeEvent {
        table: Table::Products,
        kind: ChangeKind::Update,
        record_id: Some(PRODUCT_ID.into()),
        commit_timestamp: None,
    }));
    assert!(sent.is_err());
    assert_eq!(
        controller.product_by_id(&product_id()).unwrap().status,
        ProductStatus::Available
    );
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_replaces_every_collection() {
    const STALE_CATEGORY_ID: &str = "5a7c9e1b-3d5f-4a2c-8e6b-1d3f5a7c9e2b";

    let server = MockServer::start().await;
    // What start() sees.
    let initial = [
        (
            "categories",
            json!([
                category_json(),
                { "id": STALE_CATEGORY_ID, "name": "Shoes", "code": "SHO" }
            ]),
        ),
        ("products", json!([product_json("available")])),
        ("reservations", json!([])),
        ("settings", json!([])),
    ];
    for (table, rows) in initial {
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{table}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    // What the refresh sees.
    mount_list(
        &server,
        "categories",
        json!([{ "id": CATEGORY_ID, "name": "Gowns", "code": "DRS" }]),
    )
    .await;
    mount_list(&server, "products", json!([product_json("reserved")])).await;
    mount_list(&server, "reservations", json!([reservation_json("pending")])).await;
    mount_list(&server, "settings", json!([settings_json()])).await;

    let controller = remote_controller(&server).await;
    assert_eq!(controller.categories_snapshot().len(), 2);
    assert!(controller.reservations_snapshot().is_empty());

    controller.refresh_data().await.unwrap();

    let categories = controller.categories_snapshot();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Gowns");
    assert!(
        controller
            .category_by_id(&EntityId::from(STALE_CATEGORY_ID.to_owned()))
            .is_none()
    );
    assert_eq!(
        controller.product_by_id(&product_id()).unwrap().status,
        ProductStatus::Reserved
    );
    assert_eq!(
        controller
            .reservation_by_product_id(&product_id())
            .unwrap()
            .customer_name,
        "Ana"
    );
    assert_eq!(controller.settings().store_name, "Remote Boutique");
}
