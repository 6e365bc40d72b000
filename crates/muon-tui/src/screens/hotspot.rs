//! Hotspot screen — status card, toggle, and connected-device table.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use muon_core::{DependencyStatus, DeviceRecord, HotspotStatus, PanelSettings};

use crate::action::{Action, ConfirmAction, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::signal_bars;

pub struct HotspotScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    status: HotspotStatus,
    devices: Arc<Vec<DeviceRecord>>,
    settings: Option<PanelSettings>,
    dependencies: Option<DependencyStatus>,
    radio_blocked: bool,
    reveal_passphrase: bool,
    installing: bool,
    table_state: TableState,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl HotspotScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            status: HotspotStatus::Stopped,
            devices: Arc::new(Vec::new()),
            settings: None,
            dependencies: None,
            radio_blocked: false,
            reveal_passphrase: false,
            installing: false,
            table_state: TableState::default(),
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    /// Whether the install gate blocks hotspot control.
    fn gated(&self) -> bool {
        self.dependencies.is_some_and(|d| !d.satisfied())
    }

    fn selected_device(&self) -> Option<&DeviceRecord> {
        self.devices.get(self.table_state.selected().unwrap_or(0))
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    fn move_selection(&mut self, delta: isize) {
        if self.devices.is_empty() {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, self.devices.len() as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn notify(&self, notification: Notification) {
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::Notify(notification));
        }
    }

    // ── Render helpers ───────────────────────────────────────────────

    fn render_status_card(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Hotspot ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let status_span = match self.status {
            HotspotStatus::Running => {
                Span::styled("● running", Style::default().fg(theme::SUCCESS_GREEN))
            }
            HotspotStatus::Loading => {
                Span::styled("◐ switching", Style::default().fg(theme::AMBER))
            }
            HotspotStatus::Stopped => {
                Span::styled("○ stopped", Style::default().fg(theme::BORDER_GRAY))
            }
        };

        let ssid = self
            .settings
            .as_ref()
            .map_or("─", |s| s.credentials.ssid.as_str());
        let ip = self
            .settings
            .as_ref()
            .map_or("Unknown", |s| s.ip_address.as_str());
        let passphrase = self.settings.as_ref().map_or_else(String::new, |s| {
            if self.reveal_passphrase {
                s.credentials.passphrase.clone()
            } else {
                "•".repeat(s.credentials.passphrase.chars().count())
            }
        });
        let subnet = self
            .settings
            .as_ref()
            .map_or_else(|| "─".into(), |s| s.subnet.triple().to_string());

        let mut lines = vec![
            Line::from(vec![Span::raw(" "), status_span]),
            Line::from(vec![
                Span::styled(" SSID       ", theme::key_hint()),
                Span::styled(ssid, Style::default().fg(theme::DIM_WHITE)),
            ]),
            Line::from(vec![
                Span::styled(" Passphrase ", theme::key_hint()),
                Span::styled(passphrase, Style::default().fg(theme::DIM_WHITE)),
                Span::styled("  (r reveal)", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled(" Subnet     ", theme::key_hint()),
                Span::styled(subnet, Style::default().fg(theme::DIM_WHITE)),
            ]),
            Line::from(vec![
                Span::styled(" Host IP    ", theme::key_hint()),
                Span::styled(ip, Style::default().fg(theme::DIM_WHITE)),
            ]),
        ];

        if self.radio_blocked {
            lines.push(Line::from(Span::styled(
                " ⚠ WLAN is blocked by rfkill — the hotspot may not start",
                Style::default().fg(theme::AMBER),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_device_table(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Connected Devices ({}) ", self.devices.len());
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.status != HotspotStatus::Running {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " Hotspot is not running",
                    theme::key_hint(),
                ))),
                inner,
            );
            return;
        }
        if self.devices.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " No devices connected",
                    theme::key_hint(),
                ))),
                inner,
            );
            return;
        }

        let header = Row::new(vec!["Hostname", "IP", "MAC", "Signal"])
            .style(theme::table_header());
        let rows: Vec<Row> = self
            .devices
            .iter()
            .map(|d| {
                Row::new(vec![
                    Cell::from(d.hostname.clone().unwrap_or_default()),
                    Cell::from(d.ip.clone().unwrap_or_default()),
                    Cell::from(d.mac.clone()),
                    Cell::from(Line::from(signal_bars::signal_span(d.signal_strength))),
                ])
                .style(theme::table_row())
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(16),
                Constraint::Length(15),
                Constraint::Length(17),
                Constraint::Length(6),
            ],
        )
        .header(header)
        .row_highlight_style(theme::table_selected());

        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, inner, &mut state);
    }

    fn render_install_gate(&self, frame: &mut Frame, area: Rect) {
        let Some(deps) = self.dependencies else {
            return;
        };
        let width = 54u16.min(area.width.saturating_sub(4));
        let height = 7u16;
        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let gate_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            gate_area,
        );

        let block = Block::default()
            .title(" Missing Dependencies ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::AMBER));
        let inner = block.inner(gate_area);
        frame.render_widget(block, gate_area);

        let mut missing = Vec::new();
        if !deps.dnsmasq {
            missing.push("dnsmasq");
        }
        if !deps.hostapd {
            missing.push("hostapd");
        }

        let text = vec![
            Line::from(Span::styled(
                format!("  The hotspot needs: {}", missing.join(", ")),
                Style::default().fg(theme::DIM_WHITE),
            )),
            Line::from(Span::styled(
                "  Hotspot control is disabled until installed.",
                theme::key_hint(),
            )),
        ];
        frame.render_widget(Paragraph::new(text), inner);

        let status_area = Rect::new(
            inner.x,
            inner.y + 3,
            inner.width,
            inner.height.saturating_sub(3).max(1),
        );
        if self.installing {
            let throbber = throbber_widgets_tui::Throbber::default()
                .label("Installing\u{2026}")
                .style(Style::default().fg(theme::AMBER));
            let mut state = self.throbber_state.clone();
            frame.render_stateful_widget(throbber, status_area, &mut state);
        } else {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("  i ", theme::key_hint_key()),
                    Span::styled("install now", theme::key_hint()),
                ])),
                status_area,
            );
        }
    }
}

impl Component for HotspotScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => {
                if self.gated() {
                    self.notify(Notification::warning(
                        "Install missing dependencies first",
                    ));
                    return Ok(None);
                }
                if self.status == HotspotStatus::Loading {
                    return Ok(None);
                }
                return Ok(Some(Action::RequestToggle));
            }
            KeyCode::Char('i') => {
                if self.gated() && !self.installing {
                    self.installing = true;
                    return Ok(Some(Action::RequestInstall));
                }
            }
            KeyCode::Char('r') => {
                self.reveal_passphrase = !self.reveal_passphrase;
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('x') => {
                if let Some(device) = self.selected_device() {
                    let name = device
                        .hostname
                        .clone()
                        .filter(|h| !h.is_empty())
                        .unwrap_or_else(|| device.mac.clone());
                    return Ok(Some(Action::ShowConfirm(ConfirmAction::KickDevice {
                        mac: device.mac.clone(),
                        name,
                    })));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StatusUpdated(status) => {
                self.status = *status;
                if *status != HotspotStatus::Running {
                    self.table_state.select(None);
                }
            }
            Action::DevicesUpdated(devices) => {
                self.devices = devices.clone();
                if self.devices.is_empty() {
                    self.table_state.select(None);
                } else if self.table_state.selected().is_none() {
                    self.table_state.select(Some(0));
                } else {
                    let max = self.devices.len() - 1;
                    if self.table_state.selected().unwrap_or(0) > max {
                        self.table_state.select(Some(max));
                    }
                }
            }
            Action::SettingsUpdated(settings) => {
                self.settings = Some(settings.clone());
            }
            Action::DependenciesUpdated(deps) => {
                self.dependencies = *deps;
                if deps.is_some_and(DependencyStatus::satisfied) {
                    self.installing = false;
                }
            }
            Action::RadioBlockedUpdated(blocked) => {
                self.radio_blocked = *blocked;
            }
            Action::InstallFinished(result) => {
                self.installing = false;
                if let Err(message) = result {
                    return Ok(Some(Action::Notify(Notification::error(format!(
                        "Install failed: {message}"
                    )))));
                }
            }
            Action::Tick => {
                if self.status == HotspotStatus::Loading || self.installing {
                    self.throbber_state.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(8), // Status card
            Constraint::Min(4),    // Device table
            Constraint::Length(1), // Key hints
        ])
        .split(area);

        self.render_status_card(frame, layout[0]);
        self.render_device_table(frame, layout[1]);

        let hints = Line::from(vec![
            Span::styled(" Space ", theme::key_hint_key()),
            Span::styled("toggle  ", theme::key_hint()),
            Span::styled("j/k ", theme::key_hint_key()),
            Span::styled("select  ", theme::key_hint()),
            Span::styled("x ", theme::key_hint_key()),
            Span::styled("kick  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("reveal", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[2]);

        if self.gated() {
            self.render_install_gate(frame, area);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "hotspot"
    }
}
