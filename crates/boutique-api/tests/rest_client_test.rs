#![allow(clippy::unwrap_used)]

// Integration tests for `RestClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use boutique_api::rest::rows::{CategoryRow, ProductPatch, ReservationPatch, SettingsRow};
use boutique_api::{Error, RestClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let client = RestClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn product_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "reference": "DRS26-0042",
        "name": "Dress A",
        "price": 100.0,
        "description": "Linen",
        "images": ["1.jpg", "2.jpg", "3.jpg", "4.jpg"],
        "category_id": "0d5e7c1b-3a2f-4e6d-8b9c-1f2a3b4c5d6e",
        "status": status,
        "created_at": "2026-03-01T10:00:00Z"
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_categories() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .and(query_param("select", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "c1", "name": "Dresses", "code": "DRS" },
            { "id": "c2", "name": "Tops", "code": "TOP" }
        ])))
        .mount(&server)
        .await;

    let rows = client.list_categories().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].code, "DRS");
    assert_eq!(rows[1].name, "Tops");
}

#[tokio::test]
async fn test_insert_category_returns_representation() {
    let (server, client) = setup().await;

    let row = CategoryRow {
        id: "c1".into(),
        name: "Dresses".into(),
        code: "DRS".into(),
    };

    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(json!({ "id": "c1", "name": "Dresses", "code": "DRS" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": "c1", "name": "Dresses", "code": "DRS" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.insert_category(&row).await.unwrap();
    assert_eq!(created, row);
}

#[tokio::test]
async fn test_update_product_sends_only_present_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .and(body_json(json!({ "status": "reserved" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json("p1", "reserved")])))
        .expect(1)
        .mount(&server)
        .await;

    let patch = ProductPatch {
        status: Some("reserved".into()),
        ..ProductPatch::default()
    };
    let row = client.update_product("p1", &patch).await.unwrap();

    assert_eq!(row.status, "reserved");
    assert_eq!(row.reference, "DRS26-0042");
}

#[tokio::test]
async fn test_update_matching_no_row_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let patch = ReservationPatch {
        status: Some("completed".into()),
    };
    let err = client.update_reservation("missing", &patch).await.unwrap_err();

    assert!(err.is_not_found(), "expected not-found, got {err:?}");
    assert!(matches!(err, Error::RowNotFound { ref id, .. } if id == "missing"));
}

#[tokio::test]
async fn test_delete_by_id() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/products"))
        .and(query_param("id", "eq.p1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_product("p1").await.unwrap();
}

#[tokio::test]
async fn test_get_settings_empty_table() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(client.get_settings().await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_settings_without_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/settings"))
        .and(body_json(json!({
            "store_name": "Shop",
            "logo_url": "/logo.png",
            "slogan": "Style",
            "whatsapp_number": "+50500000000",
            "exchange_rate": 36.5
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "s1",
            "store_name": "Shop",
            "logo_url": "/logo.png",
            "slogan": "Style",
            "whatsapp_number": "+50500000000",
            "exchange_rate": 36.5
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let row = SettingsRow {
        id: None,
        store_name: "Shop".into(),
        logo_url: "/logo.png".into(),
        slogan: "Style".into(),
        whatsapp_number: "+50500000000".into(),
        exchange_rate: 36.5,
    };
    let saved = client.insert_settings(&row).await.unwrap();
    assert_eq!(saved.id.as_deref(), Some("s1"));
}

#[tokio::test]
async fn test_transport_config_injects_auth_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/reservations"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let transport = TransportConfig::new("anon-key".into(), Duration::from_secs(5))
        .with_access_token("user-jwt".into());
    let client = RestClient::new(&server.uri(), &transport).unwrap();

    assert!(client.list_reservations().await.unwrap().is_empty());
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_error_envelope_is_parsed() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "duplicate key value violates unique constraint",
            "code": "23505",
            "details": "Key (code)=(DRS) already exists.",
            "hint": null
        })))
        .mount(&server)
        .await;

    let row = CategoryRow {
        id: "c1".into(),
        name: "Dresses".into(),
        code: "DRS".into(),
    };
    let err = client.insert_category(&row).await.unwrap_err();

    match &err {
        Error::Api {
            status,
            message,
            details,
            ..
        } => {
            assert_eq!(*status, 409);
            assert!(message.contains("duplicate key"));
            assert_eq!(details.as_deref(), Some("Key (code)=(DRS) already exists."));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(err.api_error_code(), Some("23505"));
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "JWT expired" })))
        .mount(&server)
        .await;

    let err = client.list_products().await.unwrap_err();
    assert!(matches!(err, Error::Authentication { ref message } if message == "JWT expired"));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = client.list_products().await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>gateway</html>"),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_response_is_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig::new("anon-key".into(), Duration::from_millis(200));
    let client = RestClient::new(&server.uri(), &transport).unwrap();

    let err = client.list_categories().await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert!(matches!(err, Error::Timeout { .. }));
}
