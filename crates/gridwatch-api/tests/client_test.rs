#![allow(clippy::unwrap_used)]
// Integration tests for `GatewayClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gridwatch_api::{Error, GatewayClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, GatewayClient) {
    let server = MockServer::start().await;
    let client = GatewayClient::with_client(reqwest::Client::new(), &server.uri()).unwrap();
    (server, client)
}

// ── Device registry tests ───────────────────────────────────────────

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "id": "rb-4011",
            "identity": "core-router",
            "host": "10.0.0.1",
            "port": 8728,
            "online": true
        },
        {
            "id": "hex-s",
            "identity": "branch-gw",
            "host": "10.0.2.1",
            "port": 8728,
            "online": false
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id, "rb-4011");
    assert_eq!(devices[0].identity, "core-router");
    assert!(devices[0].online);
    assert!(!devices[1].online);
}

#[tokio::test]
async fn test_list_interfaces() {
    let (server, client) = setup().await;

    let body = json!([
        { "name": "ether1", "type": "ether", "running": true, "disabled": false },
        { "name": "wlan1", "type": "wlan", "running": false, "disabled": true }
    ]);

    Mock::given(method("GET"))
        .and(path("/v1/devices/rb-4011/interfaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let interfaces = client.list_interfaces("rb-4011").await.unwrap();

    assert_eq!(interfaces.len(), 2);
    assert_eq!(interfaces[0].name, "ether1");
    assert_eq!(interfaces[0].kind, "ether");
    assert!(interfaces[0].running);
    assert!(interfaces[1].disabled);
}

// ── Counter fetch tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_counters() {
    let (server, client) = setup().await;

    let expected_request = json!({ "interfaces": ["ether1", "ether2"] });
    let body = json!([
        { "name": "ether1", "rxBytes": 123_456_789_u64, "txBytes": 987_654_u64 },
        { "name": "ether2", "rxBytes": 42_u64, "txBytes": 0_u64 }
    ]);

    Mock::given(method("POST"))
        .and(path("/v1/devices/rb-4011/counters"))
        .and(body_json(&expected_request))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let names = vec!["ether1".to_owned(), "ether2".to_owned()];
    let counters = client.fetch_counters("rb-4011", &names).await.unwrap();

    assert_eq!(counters.len(), 2);
    assert_eq!(counters[0].name, "ether1");
    assert_eq!(counters[0].rx_bytes, 123_456_789);
    assert_eq!(counters[1].tx_bytes, 0);
}

#[tokio::test]
async fn test_fetch_counters_gateway_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/devices/down-device/counters"))
        .respond_with(
            ResponseTemplate::new(502).set_body_json(json!({ "message": "device unreachable" })),
        )
        .mount(&server)
        .await;

    let names = vec!["ether1".to_owned()];
    let result = client.fetch_counters("down-device", &names).await;

    match result {
        Err(Error::Gateway { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "device unreachable");
        }
        other => panic!("expected Gateway error, got: {other:?}"),
    }
}

// ── Settings store tests ────────────────────────────────────────────

#[tokio::test]
async fn test_get_setting_present() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/settings/wallboard.layout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "wallboard.layout",
            "value": "3x3"
        })))
        .mount(&server)
        .await;

    let value = client.get_setting("wallboard.layout").await.unwrap();
    assert_eq!(value.as_deref(), Some("3x3"));
}

#[tokio::test]
async fn test_get_setting_missing_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/settings/wallboard.slots"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let value = client.get_setting("wallboard.slots").await.unwrap();
    assert!(value.is_none());
}

#[tokio::test]
async fn test_put_setting() {
    let (server, client) = setup().await;

    let expected_body = json!({
        "value": "[]",
        "description": "wallboard slot assignments"
    });

    Mock::given(method("PUT"))
        .and(path("/v1/settings/wallboard.slots"))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client
        .put_setting("wallboard.slots", "[]", Some("wallboard slot assignments"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let result = client.list_devices().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}
