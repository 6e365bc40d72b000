//! Panel controller behavior against a mocked bridge backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use muon_api::BridgeClient;
use muon_core::{HotspotStatus, Panel, PanelConfig, PanelError};

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": result, "error": null }))
}

async fn panel_for(server: &MockServer) -> Panel {
    let base = Url::parse(&server.uri()).unwrap();
    let bridge = BridgeClient::with_client(reqwest::Client::new(), base.clone());
    let config = PanelConfig {
        bridge_url: base,
        request_timeout: Duration::from_secs(2),
        device_poll_interval: Duration::from_millis(50),
        install_settle_delay: Duration::from_millis(10),
    };
    Panel::with_bridge(bridge, config)
}

async fn device_fetch_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/bridge/get_connected_devices")
        .count()
}

/// Mount the calls every successful `init` makes, with stored
/// credentials present so the failsafe path stays cold.
async fn mount_mount_sequence(server: &MockServer, active: bool) {
    Mock::given(method("POST"))
        .and(path("/bridge/get_ip_address"))
        .respond_with(ok(json!("192.168.0.12")))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/load_settings"))
        .respond_with(ok(json!({
            "ssid": "deck",
            "passphrase": "hunter22hunter22",
            "always_use_stored_credentials": true,
            "ip_address": "192.168.8.1",
            "dhcp_range": "192.168.8.100,192.168.8.200,12h"
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/check_dependencies"))
        .respond_with(ok(json!({ "dnsmasq": true, "hostapd": true })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_hotspot_active"))
        .respond_with(ok(json!(active)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_rfkill_blocking_wlan"))
        .respond_with(ok(json!(false)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn init_seeds_state_from_backend() {
    let server = MockServer::start().await;
    mount_mount_sequence(&server, false).await;

    let panel = panel_for(&server).await;
    panel.init().await.unwrap();

    assert_eq!(panel.status(), HotspotStatus::Stopped);
    let settings = panel.settings().unwrap();
    assert_eq!(settings.credentials.ssid, "deck");
    assert_eq!(settings.ip_address, "192.168.0.12");
    assert_eq!(settings.subnet.octets, [192, 168, 8, 1]);
    assert_eq!(
        *panel.dependencies_rx().borrow(),
        Some(muon_core::DependencyStatus {
            dnsmasq: true,
            hostapd: true
        })
    );
    panel.shutdown();
}

#[tokio::test]
async fn init_generates_failsafe_credentials_when_missing() {
    let server = MockServer::start().await;

    // "undefined" SSID plus empty passphrase counts as absent.
    Mock::given(method("POST"))
        .and(path("/bridge/load_settings"))
        .respond_with(ok(json!({
            "ssid": "undefined",
            "passphrase": "",
            "always_use_stored_credentials": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/get_hostname"))
        .respond_with(ok(json!("steamdeck")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/update_credentials"))
        .respond_with(ok(json!({
            "ssid": "steamdeck",
            "passphrase": "Abcd2345",
            "always_use_stored_credentials": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/get_ip_address"))
        .respond_with(ok(json!("192.168.0.12")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/check_dependencies"))
        .respond_with(ok(json!(true)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_hotspot_active"))
        .respond_with(ok(json!(false)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_rfkill_blocking_wlan"))
        .respond_with(ok(json!(false)))
        .mount(&server)
        .await;

    let panel = panel_for(&server).await;
    panel.init().await.unwrap();

    let settings = panel.settings().unwrap();
    assert_eq!(settings.credentials.ssid, "steamdeck");
    assert_eq!(settings.credentials.passphrase, "Abcd2345");
    panel.shutdown();
}

#[tokio::test]
async fn init_does_not_push_credentials_when_stored_pair_is_valid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bridge/update_credentials"))
        .respond_with(ok(json!(null)))
        .expect(0)
        .mount(&server)
        .await;
    mount_mount_sequence(&server, false).await;

    let panel = panel_for(&server).await;
    panel.init().await.unwrap();
    panel.shutdown();
}

#[tokio::test]
async fn toggle_with_short_passphrase_never_reaches_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bridge/start_hotspot"))
        .respond_with(ok(json!(null)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/stop_hotspot"))
        .respond_with(ok(json!(null)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/load_settings"))
        .respond_with(ok(json!({
            "ssid": "deck",
            "passphrase": "short",
            "always_use_stored_credentials": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/get_ip_address"))
        .respond_with(ok(json!("192.168.0.12")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/check_dependencies"))
        .respond_with(ok(json!(true)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_hotspot_active"))
        .respond_with(ok(json!(false)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_rfkill_blocking_wlan"))
        .respond_with(ok(json!(false)))
        .mount(&server)
        .await;

    let panel = panel_for(&server).await;
    panel.init().await.unwrap();

    let result = panel.toggle().await;
    assert!(matches!(result, Err(PanelError::PassphraseLength)));
    // Rejected before the Loading transition.
    assert_eq!(panel.status(), HotspotStatus::Stopped);
    panel.shutdown();
}

#[tokio::test]
async fn toggle_start_reconciles_to_running() {
    let server = MockServer::start().await;

    // First answer seeds init; the second is the post-toggle check.
    Mock::given(method("POST"))
        .and(path("/bridge/is_hotspot_active"))
        .respond_with(ok(json!(false)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/start_hotspot"))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;
    mount_mount_sequence(&server, true).await;

    let panel = panel_for(&server).await;
    panel.init().await.unwrap();
    assert_eq!(panel.status(), HotspotStatus::Stopped);

    let reconciled = panel.toggle().await.unwrap();
    assert_eq!(reconciled, HotspotStatus::Running);
    assert_eq!(panel.status(), HotspotStatus::Running);
    panel.shutdown();
}

#[tokio::test]
async fn toggle_reconciliation_overrides_optimistic_state() {
    let server = MockServer::start().await;

    // start_hotspot "succeeds" but the backend never actually comes up.
    Mock::given(method("POST"))
        .and(path("/bridge/start_hotspot"))
        .respond_with(ok(json!(null)))
        .mount(&server)
        .await;
    mount_mount_sequence(&server, false).await;

    let panel = panel_for(&server).await;
    panel.init().await.unwrap();

    let reconciled = panel.toggle().await.unwrap();
    assert_eq!(reconciled, HotspotStatus::Stopped);
    assert_eq!(panel.status(), HotspotStatus::Stopped);
    panel.shutdown();
}

#[tokio::test]
async fn toggle_failure_still_reconciles_status() {
    let server = MockServer::start().await;

    // The start call errors, yet the hotspot is in fact up.
    Mock::given(method("POST"))
        .and(path("/bridge/start_hotspot"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_hotspot_active"))
        .respond_with(ok(json!(false)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_mount_sequence(&server, true).await;

    let panel = panel_for(&server).await;
    panel.init().await.unwrap();

    let result = panel.toggle().await;
    assert!(result.is_err());
    assert_eq!(panel.status(), HotspotStatus::Running);
    panel.shutdown();
}

#[tokio::test]
async fn device_poll_runs_only_while_running() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bridge/get_connected_devices"))
        .respond_with(ok(json!([
            {"mac": "aa:bb:cc:dd:ee:ff", "ip": "192.168.8.100", "hostname": "phone", "signal_strength": -55}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/stop_hotspot"))
        .respond_with(ok(json!(null)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_hotspot_active"))
        .respond_with(ok(json!(true)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_mount_sequence(&server, false).await;

    let panel = panel_for(&server).await;
    panel.init().await.unwrap();
    assert_eq!(panel.status(), HotspotStatus::Running);

    let mut devices_rx = panel.devices_rx();
    tokio::time::timeout(Duration::from_secs(2), devices_rx.changed())
        .await
        .expect("first poll within interval")
        .unwrap();
    assert_eq!(devices_rx.borrow_and_update().len(), 1);

    // Stopping flips the watch; the task clears the list within a tick.
    let reconciled = panel.toggle().await.unwrap();
    assert_eq!(reconciled, HotspotStatus::Stopped);
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            devices_rx.changed().await.unwrap();
            if devices_rx.borrow_and_update().is_empty() {
                break;
            }
        }
    })
    .await
    .expect("device list cleared after stop");

    // The cleared list means the poll task is parked again; no further
    // device fetches may land while the hotspot stays down.
    let fetches_at_stop = device_fetch_count(&server).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(device_fetch_count(&server).await, fetches_at_stop);
    panel.shutdown();
}

#[tokio::test]
async fn install_is_single_flight_and_rechecks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bridge/check_dependencies"))
        .respond_with(ok(json!({ "dnsmasq": false, "hostapd": true })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/check_dependencies"))
        .respond_with(ok(json!({ "dnsmasq": true, "hostapd": true })))
        .mount(&server)
        .await;
    // Only dnsmasq is missing, so the args must be [true, false].
    Mock::given(method("POST"))
        .and(path("/bridge/install_dependencies"))
        .and(body_json(json!([true, false])))
        .respond_with(
            ok(json!({ "success": true })).set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/get_ip_address"))
        .respond_with(ok(json!("192.168.0.12")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/load_settings"))
        .respond_with(ok(json!({
            "ssid": "deck",
            "passphrase": "hunter22hunter22",
            "always_use_stored_credentials": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_hotspot_active"))
        .respond_with(ok(json!(false)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/is_rfkill_blocking_wlan"))
        .respond_with(ok(json!(false)))
        .mount(&server)
        .await;

    let panel = panel_for(&server).await;
    panel.init().await.unwrap();

    let (first, second) = tokio::join!(
        panel.install_missing_dependencies(),
        panel.install_missing_dependencies(),
    );

    let outcomes = [first, second];
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(PanelError::InstallInFlight)))
            .count(),
        1
    );
    let done = outcomes
        .iter()
        .find_map(|r| r.as_ref().ok())
        .expect("one install completes");
    assert!(done.satisfied());
    assert_eq!(
        *panel.dependencies_rx().borrow(),
        Some(muon_core::DependencyStatus {
            dnsmasq: true,
            hostapd: true
        })
    );
    panel.shutdown();
}

#[tokio::test]
async fn save_settings_pushes_credentials_then_subnet() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bridge/update_credentials"))
        .and(body_json(json!(["deck", "newpass123", true])))
        .respond_with(ok(json!({
            "ssid": "deck",
            "passphrase": "newpass123",
            "always_use_stored_credentials": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/update_dhcp"))
        .and(body_json(json!([
            "192.168.10.1",
            "192.168.10.50",
            "192.168.10.150"
        ])))
        .respond_with(ok(json!({
            "ip_address": "192.168.10.1",
            "dhcp_range": "192.168.10.50,192.168.10.150,12h"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let panel = panel_for(&server).await;
    let credentials = muon_core::Credentials {
        ssid: "deck".into(),
        passphrase: "newpass123".into(),
        always_use_stored: true,
    };
    let subnet = muon_core::SubnetConfig {
        octets: [192, 168, 10, 1],
        dhcp_start: 50,
        dhcp_end: 150,
    };

    let saved = panel.save_settings(credentials, subnet).await.unwrap();
    assert_eq!(saved.subnet.octets, [192, 168, 10, 1]);
    assert_eq!(saved.subnet.dhcp_start, 50);
    assert_eq!(saved.subnet.dhcp_end, 150);
    assert_eq!(saved.credentials.passphrase, "newpass123");

    let snapshot = panel.settings().unwrap();
    assert_eq!(snapshot, saved);
    panel.shutdown();
}

#[tokio::test]
async fn save_settings_rejects_short_passphrase_before_any_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bridge/update_credentials"))
        .respond_with(ok(json!(null)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bridge/update_dhcp"))
        .respond_with(ok(json!(null)))
        .expect(0)
        .mount(&server)
        .await;

    let panel = panel_for(&server).await;
    let credentials = muon_core::Credentials {
        ssid: "deck".into(),
        passphrase: "short".into(),
        always_use_stored: false,
    };
    let result = panel
        .save_settings(credentials, muon_core::SubnetConfig::default())
        .await;
    assert!(matches!(result, Err(PanelError::PassphraseLength)));
}
