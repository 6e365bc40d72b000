//! Panel controller — hotspot control/status reconciliation and
//! device-list synchronization.
//!
//! The panel mirrors backend state into `tokio::sync::watch` channels
//! that UI consumers subscribe to. Mutations go out as bridge calls;
//! the displayed hotspot status is corrected against the authoritative
//! `is_hotspot_active` answer after every toggle attempt, so an
//! optimistic guess can never permanently diverge from backend truth.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use muon_api::{BridgeClient, DependencyStatus, DeviceRecord, EventSubscription, ReconnectConfig};

use crate::config::PanelConfig;
use crate::error::PanelError;
use crate::model::{Credentials, HotspotStatus, PanelSettings, credential_present};
use crate::netcfg::SubnetConfig;
use crate::passphrase;

/// The panel's control surface and reactive state.
///
/// Cheaply cloneable via `Arc`. Call [`init`](Self::init) once after
/// construction; it performs the mount sequence and spawns the device
/// poll task. [`shutdown`](Self::shutdown) tears everything down.
#[derive(Clone)]
pub struct Panel {
    inner: Arc<PanelInner>,
}

struct PanelInner {
    bridge: BridgeClient,
    config: PanelConfig,
    status: watch::Sender<HotspotStatus>,
    devices: watch::Sender<Arc<Vec<DeviceRecord>>>,
    dependencies: watch::Sender<Option<DependencyStatus>>,
    radio_blocked: watch::Sender<bool>,
    settings: watch::Sender<Option<PanelSettings>>,
    /// Single-flight guard for dependency auto-install.
    installing: AtomicBool,
    cancel: CancellationToken,
}

impl Panel {
    pub fn new(config: PanelConfig) -> Result<Self, PanelError> {
        let bridge = BridgeClient::new(config.bridge_url.clone(), config.request_timeout)?;
        Ok(Self::with_bridge(bridge, config))
    }

    /// Build around an existing bridge client (tests).
    pub fn with_bridge(bridge: BridgeClient, config: PanelConfig) -> Self {
        let (status, _) = watch::channel(HotspotStatus::Stopped);
        let (devices, _) = watch::channel(Arc::new(Vec::new()));
        let (dependencies, _) = watch::channel(None);
        let (radio_blocked, _) = watch::channel(false);
        let (settings, _) = watch::channel(None);

        Self {
            inner: Arc::new(PanelInner {
                bridge,
                config,
                status,
                devices,
                dependencies,
                radio_blocked,
                settings,
                installing: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        }
    }

    // ── Subscriptions ───────────────────────────────────────────────

    pub fn status(&self) -> HotspotStatus {
        *self.inner.status.borrow()
    }

    pub fn status_rx(&self) -> watch::Receiver<HotspotStatus> {
        self.inner.status.subscribe()
    }

    pub fn devices_rx(&self) -> watch::Receiver<Arc<Vec<DeviceRecord>>> {
        self.inner.devices.subscribe()
    }

    pub fn dependencies_rx(&self) -> watch::Receiver<Option<DependencyStatus>> {
        self.inner.dependencies.subscribe()
    }

    pub fn radio_blocked_rx(&self) -> watch::Receiver<bool> {
        self.inner.radio_blocked.subscribe()
    }

    pub fn settings_rx(&self) -> watch::Receiver<Option<PanelSettings>> {
        self.inner.settings.subscribe()
    }

    pub fn settings(&self) -> Option<PanelSettings> {
        self.inner.settings.borrow().clone()
    }

    /// Acquire the push-event subscription. The handle shares the
    /// panel's lifetime: shutting the panel down releases it.
    pub fn subscribe_events(&self) -> Result<EventSubscription, PanelError> {
        let ws_url = self.inner.bridge.events_url()?;
        Ok(EventSubscription::connect(
            ws_url,
            ReconnectConfig::default(),
            self.inner.cancel.child_token(),
        ))
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Mount sequence: IP → settings (with credential failsafe) →
    /// dependencies → seed status from the active flag → rfkill.
    /// Spawns the device poll task before returning.
    pub async fn init(&self) -> Result<(), PanelError> {
        let bridge = &self.inner.bridge;

        // Host IP is cosmetic; a failure must not block the panel.
        let ip_address = match bridge.get_ip_address().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(error = %e, "failed to fetch IP address");
                "Unknown".to_owned()
            }
        };

        let stored = bridge.load_settings().await?;
        let credentials = self.resolve_credentials(&stored).await?;
        let subnet =
            SubnetConfig::from_stored(stored.ip_address.as_deref(), stored.dhcp_range.as_deref());

        self.inner.settings.send_replace(Some(PanelSettings {
            credentials,
            subnet,
            ip_address,
        }));

        let deps = bridge.check_dependencies().await?;
        self.inner.dependencies.send_replace(Some(deps));

        let active = bridge.is_hotspot_active().await?;
        self.inner
            .status
            .send_replace(HotspotStatus::from_active(active));

        // Advisory only — a block is surfaced as a warning, never a gate.
        match bridge.is_rfkill_blocking_wlan().await {
            Ok(blocked) => {
                self.inner.radio_blocked.send_replace(blocked);
            }
            Err(e) => warn!(error = %e, "rfkill query failed"),
        }

        self.spawn_device_poll();
        info!(status = %self.status(), "panel initialized");
        Ok(())
    }

    /// Stop background tasks and release subscriptions.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    /// Resolve credentials from the stored snapshot, generating and
    /// pushing a failsafe pair when either half is absent (empty or the
    /// literal `"undefined"`).
    async fn resolve_credentials(
        &self,
        stored: &muon_api::StoredSettings,
    ) -> Result<Credentials, PanelError> {
        let always_use = stored.always_use_stored_credentials;

        if credential_present(stored.ssid.as_deref())
            && credential_present(stored.passphrase.as_deref())
        {
            return Ok(Credentials {
                ssid: stored.ssid.clone().unwrap_or_default(),
                passphrase: stored.passphrase.clone().unwrap_or_default(),
                always_use_stored: always_use,
            });
        }

        warn!("stored credentials missing, generating failsafe");
        let ssid = self.inner.bridge.get_hostname().await?;
        let generated = passphrase::generate();
        let confirmed = self
            .inner
            .bridge
            .update_credentials(&ssid, &generated, always_use)
            .await?;

        Ok(Credentials {
            ssid: confirmed.ssid,
            passphrase: confirmed.passphrase,
            always_use_stored: confirmed.always_use_stored_credentials,
        })
    }

    // ── Hotspot control ─────────────────────────────────────────────

    /// Start or stop the hotspot according to the current status.
    ///
    /// Rejects before any remote call if the cached passphrase length is
    /// invalid. Otherwise: `Loading` → start/stop → optimistic terminal
    /// state on success → unconditional reconciliation against the
    /// backend's active flag (the correction step — it runs on the
    /// failure path too, so the displayed status always ends on backend
    /// truth). Returns the reconciled status; an `Err` means the
    /// start/stop call itself failed, with reconciliation already done.
    pub async fn toggle(&self) -> Result<HotspotStatus, PanelError> {
        let passphrase = self
            .settings()
            .map(|s| s.credentials.passphrase)
            .unwrap_or_default();
        Credentials::validate_passphrase(&passphrase)?;

        let before = self.status();
        if before == HotspotStatus::Loading {
            // A toggle is already in flight.
            return Ok(before);
        }

        self.inner.status.send_replace(HotspotStatus::Loading);

        let starting = before == HotspotStatus::Stopped;
        let attempt = if starting {
            self.inner.bridge.start_hotspot().await
        } else {
            self.inner.bridge.stop_hotspot().await
        };

        if attempt.is_ok() {
            // Optimistic guess, corrected just below.
            self.inner
                .status
                .send_replace(HotspotStatus::from_active(starting));
        } else if let Err(e) = &attempt {
            warn!(error = %e, starting, "hotspot toggle failed");
        }

        let reconciled = match self.inner.bridge.is_hotspot_active().await {
            Ok(active) => HotspotStatus::from_active(active),
            Err(e) => {
                // Reconciliation itself failed; fall back to the least
                // surprising value for each path.
                warn!(error = %e, "status reconciliation failed");
                if attempt.is_ok() {
                    HotspotStatus::from_active(starting)
                } else {
                    before
                }
            }
        };
        self.inner.status.send_replace(reconciled);

        attempt?;
        Ok(reconciled)
    }

    /// Kick (and ban) a station. The device list is never mutated
    /// locally — the next poll reflects the change.
    pub async fn kick(&self, mac: &str) -> Result<bool, PanelError> {
        Ok(self.inner.bridge.kick_mac(mac).await?)
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Save flow: credentials first, then the subnet — sequential by
    /// convention, not dependency. The confirmed credential triple is
    /// merged with the confirmed subnet into the settings snapshot;
    /// any failure propagates without touching the snapshot.
    pub async fn save_settings(
        &self,
        credentials: Credentials,
        subnet: SubnetConfig,
    ) -> Result<PanelSettings, PanelError> {
        Credentials::validate_passphrase(&credentials.passphrase)?;

        let confirmed = self
            .inner
            .bridge
            .update_credentials(
                &credentials.ssid,
                &credentials.passphrase,
                credentials.always_use_stored,
            )
            .await?;

        let triple = subnet.triple();
        let dhcp = self
            .inner
            .bridge
            .update_dhcp(&triple.base_ip, &triple.dhcp_start, &triple.dhcp_end)
            .await?;

        let confirmed_subnet =
            SubnetConfig::from_stored(Some(&dhcp.ip_address), Some(&dhcp.dhcp_range));

        let ip_address = self
            .settings()
            .map_or_else(|| "Unknown".to_owned(), |s| s.ip_address);

        let merged = PanelSettings {
            credentials: Credentials {
                ssid: confirmed.ssid,
                passphrase: confirmed.passphrase,
                always_use_stored: confirmed.always_use_stored_credentials,
            },
            subnet: confirmed_subnet,
            ip_address,
        };
        self.inner.settings.send_replace(Some(merged.clone()));
        Ok(merged)
    }

    // ── Dependencies ────────────────────────────────────────────────

    /// Install whatever `check_dependencies` reported missing, then
    /// re-query after the settle delay. Single-flight: a second call
    /// while one runs returns [`PanelError::InstallInFlight`] without
    /// touching the backend.
    pub async fn install_missing_dependencies(&self) -> Result<DependencyStatus, PanelError> {
        let current = *self.inner.dependencies.borrow();
        let Some(deps) = current else {
            return Err(PanelError::InstallFailed("dependency status unknown".into()));
        };
        if deps.satisfied() {
            return Ok(deps);
        }

        if self.inner.installing.swap(true, Ordering::SeqCst) {
            debug!("install already in flight, skipping");
            return Err(PanelError::InstallInFlight);
        }
        let result = self.run_install(deps).await;
        self.inner.installing.store(false, Ordering::SeqCst);
        result
    }

    async fn run_install(&self, deps: DependencyStatus) -> Result<DependencyStatus, PanelError> {
        let bridge = &self.inner.bridge;
        info!(dnsmasq = deps.dnsmasq, hostapd = deps.hostapd, "installing missing dependencies");

        let outcome = bridge
            .install_dependencies(!deps.dnsmasq, !deps.hostapd)
            .await?;
        if !outcome.success {
            let reason = outcome
                .error
                .unwrap_or_else(|| format!("still missing: {}", outcome.missing.join(", ")));
            return Err(PanelError::InstallFailed(reason));
        }

        // Give the package database a moment before trusting the re-check.
        tokio::time::sleep(self.inner.config.install_settle_delay).await;

        let refreshed = bridge.check_dependencies().await?;
        self.inner.dependencies.send_replace(Some(refreshed));

        if refreshed.satisfied() {
            // Mirrors the post-install path of the mount sequence.
            if let Ok(active) = bridge.is_hotspot_active().await {
                self.inner
                    .status
                    .send_replace(HotspotStatus::from_active(active));
            }
        }
        Ok(refreshed)
    }

    // ── Ban list ────────────────────────────────────────────────────

    pub async fn ban_list(&self) -> Result<Vec<String>, PanelError> {
        Ok(self.inner.bridge.retrieve_ban_list().await?)
    }

    pub async fn unban(&self, mac: &str) -> Result<bool, PanelError> {
        Ok(self.inner.bridge.unban_mac_address(mac).await?)
    }

    // ── Suspend / resume ────────────────────────────────────────────

    /// Fire-and-forget, unordered with respect to any in-flight poll.
    pub async fn notify_suspend(&self) {
        self.inner.bridge.suspend_ap().await;
    }

    pub async fn notify_resume(&self) {
        self.inner.bridge.resume_ap().await;
    }

    // ── Device poll task ────────────────────────────────────────────

    /// Background task: while status is `Running`, fetch the device
    /// list on a fixed interval (immediately on entering `Running`);
    /// the moment status leaves `Running` the poll stops and the list
    /// is cleared. Wholesale replacement every cycle, empty on error.
    fn spawn_device_poll(&self) {
        let bridge = self.inner.bridge.clone();
        let mut status_rx = self.inner.status.subscribe();
        let devices_tx = self.inner.devices.clone();
        let interval = self.inner.config.device_poll_interval;
        let cancel = self.inner.cancel.clone();

        tokio::spawn(async move {
            loop {
                // Park until the hotspot is running.
                while *status_rx.borrow_and_update() != HotspotStatus::Running {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return,
                        changed = status_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                    }
                }

                debug!("device poll started");
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return,
                        changed = status_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            if *status_rx.borrow_and_update() != HotspotStatus::Running {
                                devices_tx.send_replace(Arc::new(Vec::new()));
                                debug!("device poll stopped");
                                break;
                            }
                        }
                        _ = ticker.tick() => {
                            match bridge.get_connected_devices().await {
                                Ok(list) => {
                                    devices_tx.send_replace(Arc::new(list));
                                }
                                Err(e) => {
                                    warn!(error = %e, "device poll failed");
                                    devices_tx.send_replace(Arc::new(Vec::new()));
                                }
                            }
                        }
                    }
                }
            }
        });
    }
}
