#![allow(clippy::unwrap_used)]
// Integration tests for `BridgeClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use muon_api::{BridgeClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, BridgeClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = BridgeClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": result, "error": null }))
}

// ── Envelope handling ───────────────────────────────────────────────

#[tokio::test]
async fn test_active_flag_unwraps_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/is_hotspot_active"))
        .respond_with(ok(json!(true)))
        .mount(&server)
        .await;

    assert!(client.is_hotspot_active().await.unwrap());
}

#[tokio::test]
async fn test_bridge_error_surfaces_as_bridge_variant() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/start_hotspot"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "result": null, "error": "rfkill is blocking wlan0" })),
        )
        .mount(&server)
        .await;

    let result = client.start_hotspot().await;
    assert!(
        matches!(result, Err(Error::Bridge { ref method, .. }) if method == "start_hotspot"),
        "expected Bridge error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_http_failure_surfaces_as_transport() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/stop_hotspot"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.stop_hotspot().await;
    assert!(matches!(result, Err(Error::Transport(_))));
}

// ── Argument encoding ───────────────────────────────────────────────

#[tokio::test]
async fn test_update_credentials_sends_positional_args() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/update_credentials"))
        .and(body_json(json!(["steamdeck", "hunter22", true])))
        .respond_with(ok(json!({
            "ssid": "steamdeck",
            "passphrase": "hunter22",
            "always_use_stored_credentials": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let confirmed = client
        .update_credentials("steamdeck", "hunter22", true)
        .await
        .unwrap();
    assert_eq!(confirmed.ssid, "steamdeck");
    assert!(confirmed.always_use_stored_credentials);
}

#[tokio::test]
async fn test_update_dhcp_arg_order() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/update_dhcp"))
        .and(body_json(json!([
            "192.168.8.1",
            "192.168.8.100",
            "192.168.8.200"
        ])))
        .respond_with(ok(json!({
            "ip_address": "192.168.8.1",
            "dhcp_range": "192.168.8.100,192.168.8.200,12h"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let confirmed = client
        .update_dhcp("192.168.8.1", "192.168.8.100", "192.168.8.200")
        .await
        .unwrap();
    assert_eq!(confirmed.dhcp_range, "192.168.8.100,192.168.8.200,12h");
}

// ── Polymorphic payload normalization ───────────────────────────────

#[tokio::test]
async fn test_check_dependencies_map_shape() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/check_dependencies"))
        .respond_with(ok(json!({ "dnsmasq": true, "hostapd": false })))
        .mount(&server)
        .await;

    let status = client.check_dependencies().await.unwrap();
    assert!(status.dnsmasq);
    assert!(!status.hostapd);
    assert!(!status.satisfied());
}

#[tokio::test]
async fn test_check_dependencies_legacy_bool_shape() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/check_dependencies"))
        .respond_with(ok(json!(false)))
        .mount(&server)
        .await;

    let status = client.check_dependencies().await.unwrap();
    assert!(!status.dnsmasq);
    assert!(!status.hostapd);
}

#[tokio::test]
async fn test_device_list_string_encoded_and_filtered() {
    let (server, client) = setup().await;

    // Backend sends the list as a JSON string, with one leaseless row.
    let inner = json!([
        {"mac": "aa:aa:aa:aa:aa:aa", "ip": null, "hostname": null, "signal_strength": -44},
        {"mac": "bb:bb:bb:bb:bb:bb", "ip": "192.168.8.120", "hostname": "phone", "signal_strength": -66}
    ]);
    Mock::given(method("POST"))
        .and(path("/bridge/get_connected_devices"))
        .respond_with(ok(json!(inner.to_string())))
        .mount(&server)
        .await;

    let devices = client.get_connected_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].hostname.as_deref(), Some("phone"));
}

#[tokio::test]
async fn test_device_list_backend_error_object_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/get_connected_devices"))
        .respond_with(ok(json!({"error": "dnsmasq leases file not found"})))
        .mount(&server)
        .await;

    assert!(client.get_connected_devices().await.unwrap().is_empty());
}

// ── Settings snapshot ───────────────────────────────────────────────

#[tokio::test]
async fn test_load_settings_with_subnet_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/load_settings"))
        .respond_with(ok(json!({
            "ssid": "steamdeck",
            "passphrase": "correct horse",
            "always_use_stored_credentials": true,
            "ip_address": "192.168.8.1",
            "dhcp_range": "192.168.8.100,192.168.8.200,12h"
        })))
        .mount(&server)
        .await;

    let settings = client.load_settings().await.unwrap();
    assert_eq!(settings.ssid.as_deref(), Some("steamdeck"));
    assert_eq!(settings.ip_address.as_deref(), Some("192.168.8.1"));
}

#[tokio::test]
async fn test_load_settings_fresh_install_defaults() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/load_settings"))
        .respond_with(ok(json!({})))
        .mount(&server)
        .await;

    let settings = client.load_settings().await.unwrap();
    assert!(settings.ssid.is_none());
    assert!(!settings.always_use_stored_credentials);
}

// ── Ban list ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ban_list_roundtrip() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/retrieve_ban_list"))
        .respond_with(ok(json!(["aa:bb:cc:dd:ee:ff", "11:22:33:44:55:66"])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/bridge/unban_mac_address"))
        .and(body_json(json!(["aa:bb:cc:dd:ee:ff"])))
        .respond_with(ok(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let bans = client.retrieve_ban_list().await.unwrap();
    assert_eq!(bans.len(), 2);
    assert!(client.unban_mac_address("aa:bb:cc:dd:ee:ff").await.unwrap());
}

// ── Fire-and-forget notifications ───────────────────────────────────

#[tokio::test]
async fn test_suspend_notification_swallows_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bridge/suspend_ap"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    // Must not panic or return an error — there is nowhere to report it.
    client.suspend_ap().await;
}
