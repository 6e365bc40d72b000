//! Application core — event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use muon_core::{DeviceEventKind, HotspotStatus, Panel};

use crate::action::{Action, ConfirmAction, Notification};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// Top-level application state and event loop.
pub struct App {
    /// Current active screen.
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    /// All screen components, keyed by ScreenId.
    screens: HashMap<ScreenId, Box<dyn Component>>,
    /// Whether the app should keep running.
    running: bool,
    /// Mirror of the panel's hotspot status for the status bar.
    hotspot_status: HotspotStatus,
    /// Help overlay visibility.
    help_visible: bool,
    /// Action sender — components can dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver — main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Backend facade, cheaply cloneable into spawned tasks.
    panel: Panel,
    /// Cancellation token for the data bridge and sleep monitor tasks.
    data_cancel: CancellationToken,
    /// Pending confirmation dialog (blocks other input while active).
    pending_confirm: Option<ConfirmAction>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(panel: Panel) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> = create_screens().into_iter().collect();

        Self {
            active_screen: ScreenId::default(),
            previous_screen: None,
            screens,
            running: true,
            hotspot_status: HotspotStatus::default(),
            help_visible: false,
            action_tx,
            action_rx,
            panel,
            data_cancel: CancellationToken::new(),
            pending_confirm: None,
            notification: None,
        }
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        // Data bridge: panel init + watch-channel forwarding.
        {
            let panel = self.panel.clone();
            let tx = self.action_tx.clone();
            let cancel = self.data_cancel.clone();
            tokio::spawn(async move {
                crate::data_bridge::spawn_data_bridge(panel, tx, cancel).await;
            });
        }

        // Suspend/resume signals from logind.
        crate::sleep::spawn_sleep_monitor(self.panel.clone(), self.data_cancel.clone());

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action(s)
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Confirmation dialog captures all input
        if self.pending_confirm.is_some() {
            return match key.code {
                KeyCode::Char('y' | 'Y') | KeyCode::Enter => Ok(Some(Action::ConfirmYes)),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Ok(Some(Action::ConfirmNo)),
                _ => Ok(None),
            };
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        // The settings form captures every key except Ctrl+C and Esc,
        // so typing an SSID never collides with global bindings.
        if self.active_screen == ScreenId::WifiSettings {
            if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
                return Ok(Some(Action::Quit));
            }
            if key.code == KeyCode::Esc {
                return Ok(Some(Action::GoBack));
            }
            if let Some(screen) = self.screens.get_mut(&ScreenId::WifiSettings) {
                return screen.handle_key_event(key);
            }
            return Ok(None);
        }

        // Global keybindings
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),

            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),

            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='3')) => {
                let n = c as u8 - b'0';
                if let Some(screen) = ScreenId::from_number(n) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }

            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }

            (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::GoBack)),

            _ => {}
        }

        // Delegate to active screen component
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }

        Ok(None)
    }

    /// Process a single action — update app state and propagate to components.
    #[allow(clippy::too_many_lines)]
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Resize(..) | Action::Render => {}

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.previous_screen = Some(self.active_screen);
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }

                    // The ban list has no push channel; refetch on entry.
                    if *target == ScreenId::Banned {
                        self.action_tx.send(Action::RequestBanList)?;
                    }
                }
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::Tick => {
                // Auto-dismiss notifications after 3 seconds
                if let Some((_, created)) = &self.notification {
                    if created.elapsed() > Duration::from_secs(3) {
                        self.notification = None;
                    }
                }
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            // Data updates go to ALL screens so they stay in sync
            Action::StatusUpdated(status) => {
                self.hotspot_status = *status;
                self.broadcast(action)?;
            }
            Action::DevicesUpdated(_)
            | Action::DependenciesUpdated(_)
            | Action::RadioBlockedUpdated(_)
            | Action::SettingsUpdated(_)
            | Action::InstallFinished(_)
            | Action::SaveSettingsFinished(_)
            | Action::BanListLoaded(_)
            | Action::UnbanAccepted(_) => {
                self.broadcast(action)?;
            }

            Action::DeviceEventReceived(event) => {
                let verb = match event.kind {
                    DeviceEventKind::Connected => "connected",
                    DeviceEventKind::Disconnected => "disconnected",
                };
                self.action_tx
                    .send(Action::Notify(Notification::info(format!(
                        "{} {verb}",
                        event.subject()
                    ))))?;
            }

            // ── Backend commands ─────────────────────────────────────

            Action::RequestToggle => self.spawn_toggle(),
            Action::RequestKick(mac) => self.spawn_kick(mac.clone()),
            Action::RequestInstall => self.spawn_install(),
            Action::RequestSaveSettings {
                credentials,
                subnet,
            } => self.spawn_save_settings(credentials.clone(), *subnet),
            Action::RequestBanList => self.spawn_ban_list(),
            Action::RequestUnban(mac) => self.spawn_unban(mac.clone()),

            // Confirmation dialog management
            Action::ShowConfirm(confirm) => {
                self.pending_confirm = Some(confirm.clone());
            }

            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    match confirm {
                        ConfirmAction::KickDevice { mac, .. } => {
                            self.action_tx.send(Action::RequestKick(mac))?;
                        }
                        ConfirmAction::UnbanDevice { mac } => {
                            self.action_tx.send(Action::RequestUnban(mac))?;
                        }
                    }
                }
            }

            Action::ConfirmNo => {
                self.pending_confirm = None;
            }

            // Notifications
            Action::Notify(n) => {
                self.notification = Some((n.clone(), Instant::now()));
            }

            Action::DismissNotification => {
                self.notification = None;
            }

            // Everything else goes to the active screen only
            other => {
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(other)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Send a data action to every screen, queueing any follow-ups.
    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    // ── Backend command tasks ─────────────────────────────────────────

    fn spawn_toggle(&self) {
        let panel = self.panel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match panel.toggle().await {
                Ok(HotspotStatus::Running) => {
                    let ssid = panel
                        .settings()
                        .map_or_else(|| "hotspot".to_owned(), |s| s.credentials.ssid);
                    let _ = tx.send(Action::Notify(Notification::success(format!(
                        "Hotspot \u{201c}{ssid}\u{201d} started"
                    ))));
                }
                Ok(HotspotStatus::Stopped) => {
                    let _ = tx.send(Action::Notify(Notification::success("Hotspot stopped")));
                }
                Ok(HotspotStatus::Loading) => {}
                Err(e) => {
                    warn!(error = %e, "hotspot toggle failed");
                    let _ = tx.send(Action::Notify(Notification::error(format!("{e}"))));
                }
            }
        });
    }

    fn spawn_kick(&self, mac: String) {
        let panel = self.panel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match panel.kick(&mac).await {
                Ok(true) => {
                    let _ = tx.send(Action::Notify(Notification::success(format!(
                        "Kicked and banned {mac}"
                    ))));
                }
                Ok(false) => {
                    let _ = tx.send(Action::Notify(Notification::warning(format!(
                        "{mac} is no longer connected"
                    ))));
                }
                Err(e) => {
                    warn!(error = %e, mac, "kick failed");
                    let _ = tx.send(Action::Notify(Notification::error(format!("{e}"))));
                }
            }
        });
    }

    fn spawn_install(&self) {
        let panel = self.panel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = panel
                .install_missing_dependencies()
                .await
                .map(drop)
                .map_err(|e| e.to_string());
            let _ = tx.send(Action::InstallFinished(result));
        });
    }

    fn spawn_save_settings(
        &self,
        credentials: muon_core::Credentials,
        subnet: muon_core::SubnetConfig,
    ) {
        let panel = self.panel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = panel
                .save_settings(credentials, subnet)
                .await
                .map(drop)
                .map_err(|e| e.to_string());
            let _ = tx.send(Action::SaveSettingsFinished(result));
        });
    }

    fn spawn_ban_list(&self) {
        let panel = self.panel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match panel.ban_list().await {
                Ok(macs) => {
                    let _ = tx.send(Action::BanListLoaded(macs));
                }
                Err(e) => {
                    warn!(error = %e, "ban list fetch failed");
                    let _ = tx.send(Action::Notify(Notification::error(format!("{e}"))));
                }
            }
        });
    }

    fn spawn_unban(&self, mac: String) {
        let panel = self.panel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match panel.unban(&mac).await {
                Ok(true) => {
                    // Remove the row only once the backend has confirmed;
                    // any failure leaves the displayed list unchanged.
                    let _ = tx.send(Action::UnbanAccepted(mac.clone()));
                    let _ = tx.send(Action::Notify(Notification::success(format!(
                        "Unbanned {mac}"
                    ))));
                }
                Ok(false) => {
                    let _ = tx.send(Action::Notify(Notification::warning(format!(
                        "{mac} was not on the ban list"
                    ))));
                }
                Err(e) => {
                    warn!(error = %e, mac, "unban failed");
                    let _ = tx.send(Action::Notify(Notification::error(format!("{e}"))));
                }
            }
        });
    }

    // ── Rendering ─────────────────────────────────────────────────────

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [screen content] [tab bar] [status bar]
        let layout = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }

        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        // Overlays on top (order matters: last = topmost)
        if let Some((ref notif, _)) = self.notification {
            self.render_notification(frame, area, notif);
        }

        if let Some(ref confirm) = self.pending_confirm {
            self.render_confirm_dialog(frame, area, confirm);
        }

        if self.help_visible {
            self.render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let status_indicator = match self.hotspot_status {
            HotspotStatus::Running => {
                Span::styled("● hotspot up", Style::default().fg(theme::SUCCESS_GREEN))
            }
            HotspotStatus::Loading => {
                Span::styled("◐ switching", Style::default().fg(theme::AMBER))
            }
            HotspotStatus::Stopped => {
                Span::styled("○ hotspot down", Style::default().fg(theme::BORDER_GRAY))
            }
        };

        let hints = Span::styled(" │ ? help  Tab screens  q quit", theme::key_hint());

        let line = Line::from(vec![Span::raw(" "), status_indicator, hints]);
        frame.render_widget(Paragraph::new(line), area);
    }

    #[allow(clippy::unused_self)]
    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let help_width = 54u16.min(area.width.saturating_sub(4));
        let help_height = 18u16.min(area.height.saturating_sub(4));

        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let help_text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "  Navigation",
                Style::default().fg(theme::AQUA),
            )]),
            Line::from(Span::styled("  ─────────", theme::key_hint())),
            Line::from(vec![
                Span::styled("  1-3       ", theme::key_hint_key()),
                Span::styled("Jump to screen", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Tab       ", theme::key_hint_key()),
                Span::styled("Next screen", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  j/k ↑/↓   ", theme::key_hint_key()),
                Span::styled("Move up/down", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Esc       ", theme::key_hint_key()),
                Span::styled("Back / close", theme::key_hint()),
            ]),
            Line::from(""),
            Line::from(vec![Span::styled(
                "  Hotspot",
                Style::default().fg(theme::AQUA),
            )]),
            Line::from(Span::styled("  ───────", theme::key_hint())),
            Line::from(vec![
                Span::styled("  Space     ", theme::key_hint_key()),
                Span::styled("Toggle hotspot       ", theme::key_hint()),
                Span::styled("x  ", theme::key_hint_key()),
                Span::styled("Kick device", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  r         ", theme::key_hint_key()),
                Span::styled("Reveal passphrase    ", theme::key_hint()),
                Span::styled("i  ", theme::key_hint_key()),
                Span::styled("Install deps", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Ctrl+S    ", theme::key_hint_key()),
                Span::styled("Save settings        ", theme::key_hint()),
                Span::styled("u  ", theme::key_hint_key()),
                Span::styled("Unban", theme::key_hint()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "                     Esc or ? to close",
                theme::key_hint(),
            )),
        ];

        frame.render_widget(Paragraph::new(help_text), inner);
    }

    #[allow(clippy::unused_self)]
    fn render_confirm_dialog(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
        let width = 50u16.min(area.width.saturating_sub(4));
        let height = 5u16;

        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let dialog_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            dialog_area,
        );

        let block = Block::default()
            .title(" Confirm ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::AMBER));

        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let text = vec![
            Line::from(Span::styled(
                format!("  {confirm}"),
                Style::default().fg(theme::DIM_WHITE),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("  y ", theme::key_hint_key()),
                Span::styled("confirm    ", theme::key_hint()),
                Span::styled("n ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ]),
        ];
        frame.render_widget(Paragraph::new(text), inner);
    }

    #[allow(clippy::unused_self)]
    fn render_notification(&self, frame: &mut Frame, area: Rect, notif: &Notification) {
        use crate::action::NotificationLevel;

        #[allow(clippy::cast_possible_truncation)]
        let msg_len = notif.message.len() as u16;
        let width = (msg_len + 6).clamp(20, 60);
        let height = 3u16;

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 2); // above status bar
        let toast_area = Rect::new(area.x + x, area.y + y, width, height);

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
            NotificationLevel::Error => (theme::ERROR_RED, "✗"),
            NotificationLevel::Warning => (theme::AMBER, "!"),
            NotificationLevel::Info => (theme::AQUA, "·"),
        };

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            toast_area,
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(&notif.message, Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}
