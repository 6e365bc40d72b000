//! WiFi settings screen — credentials and subnet form.
//!
//! Octet and DHCP fields go through [`SubnetEditor`], so every edit is
//! sanitized (digits only, three chars max) and clamped to the field's
//! range the moment focus leaves the field. Save pushes credentials
//! first, then the subnet.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use muon_core::netcfg::SubnetField;
use muon_core::{Credentials, PanelSettings, SubnetConfig, SubnetEditor, passphrase};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;

/// Which form field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Ssid,
    Passphrase,
    AlwaysUse,
    Subnet(SubnetField),
}

impl Field {
    /// All fields in tab order.
    const ALL: [Field; 9] = [
        Self::Ssid,
        Self::Passphrase,
        Self::AlwaysUse,
        Self::Subnet(SubnetField::Octet(0)),
        Self::Subnet(SubnetField::Octet(1)),
        Self::Subnet(SubnetField::Octet(2)),
        Self::Subnet(SubnetField::LastOctet),
        Self::Subnet(SubnetField::RangeStart),
        Self::Subnet(SubnetField::RangeEnd),
    ];
}

pub struct WifiSettingsScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    active_field: Field,
    ssid_input: String,
    passphrase_input: String,
    always_use: bool,
    editor: SubnetEditor,
    /// Live buffer for the focused subnet field; committed on blur.
    subnet_buffer: String,
    dirty: bool,
    saving: bool,
}

impl WifiSettingsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            active_field: Field::Ssid,
            ssid_input: String::new(),
            passphrase_input: String::new(),
            always_use: false,
            editor: SubnetEditor::new(SubnetConfig::default()),
            subnet_buffer: String::new(),
            dirty: false,
            saving: false,
        }
    }

    fn load_from_settings(&mut self, settings: &PanelSettings) {
        self.ssid_input.clone_from(&settings.credentials.ssid);
        self.passphrase_input
            .clone_from(&settings.credentials.passphrase);
        self.always_use = settings.credentials.always_use_stored;
        self.editor = SubnetEditor::new(settings.subnet);
        if let Field::Subnet(field) = self.active_field {
            self.subnet_buffer = self.editor.field_text(field);
        }
    }

    // ── Field navigation ─────────────────────────────────────────────

    fn focus(&mut self, target: Field) {
        self.commit_subnet_field();
        self.active_field = target;
        if let Field::Subnet(field) = target {
            self.subnet_buffer = self.editor.field_text(field);
        }
    }

    fn focus_next(&mut self) {
        let pos = Field::ALL
            .iter()
            .position(|&f| f == self.active_field)
            .unwrap_or(0);
        self.focus(Field::ALL[(pos + 1) % Field::ALL.len()]);
    }

    fn focus_prev(&mut self) {
        let pos = Field::ALL
            .iter()
            .position(|&f| f == self.active_field)
            .unwrap_or(0);
        self.focus(Field::ALL[(pos + Field::ALL.len() - 1) % Field::ALL.len()]);
    }

    /// Commit the live buffer into the editor when leaving a subnet
    /// field. A rejected buffer reverts to the editor's current value.
    fn commit_subnet_field(&mut self) {
        if let Field::Subnet(field) = self.active_field {
            if self.editor.set_field(field, &self.subnet_buffer).is_none() {
                self.subnet_buffer = self.editor.field_text(field);
            }
        }
    }

    // ── Editing ──────────────────────────────────────────────────────

    fn input_char(&mut self, c: char) {
        self.dirty = true;
        match self.active_field {
            Field::Ssid => self.ssid_input.push(c),
            Field::Passphrase => self.passphrase_input.push(c),
            Field::AlwaysUse => {
                if c == ' ' {
                    self.always_use = !self.always_use;
                }
            }
            Field::Subnet(_) => {
                // Digits only, three characters max.
                if c.is_ascii_digit() && self.subnet_buffer.len() < 3 {
                    self.subnet_buffer.push(c);
                }
            }
        }
    }

    fn backspace(&mut self) {
        self.dirty = true;
        match self.active_field {
            Field::Ssid => {
                self.ssid_input.pop();
            }
            Field::Passphrase => {
                self.passphrase_input.pop();
            }
            Field::AlwaysUse => {}
            Field::Subnet(_) => {
                self.subnet_buffer.pop();
            }
        }
    }

    fn regenerate_passphrase(&mut self) {
        self.passphrase_input = passphrase::generate();
        self.dirty = true;
    }

    fn save(&mut self) -> Option<Action> {
        self.commit_subnet_field();

        let credentials = Credentials {
            ssid: self.ssid_input.clone(),
            passphrase: self.passphrase_input.clone(),
            always_use_stored: self.always_use,
        };
        if Credentials::validate_passphrase(&credentials.passphrase).is_err() {
            return Some(Action::Notify(Notification::error(
                "Passphrase must be 8-63 characters",
            )));
        }

        self.saving = true;
        Some(Action::RequestSaveSettings {
            credentials,
            subnet: self.editor.config(),
        })
    }

    // ── Render helpers ───────────────────────────────────────────────

    fn field_style(&self, field: Field) -> Style {
        if self.active_field == field && self.focused {
            theme::field_active()
        } else {
            theme::field_inactive()
        }
    }

    fn subnet_text(&self, field: SubnetField) -> String {
        if self.active_field == Field::Subnet(field) {
            format!("{}_", self.subnet_buffer)
        } else {
            self.editor.field_text(field)
        }
    }
}

impl Component for WifiSettingsScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.saving {
            return Ok(None);
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => return Ok(self.save()),
            (KeyModifiers::CONTROL, KeyCode::Char('g')) => {
                if self.active_field == Field::Passphrase {
                    self.regenerate_passphrase();
                }
            }
            (_, KeyCode::Tab | KeyCode::Down) => self.focus_next(),
            (_, KeyCode::BackTab | KeyCode::Up) => self.focus_prev(),
            (_, KeyCode::Backspace) => self.backspace(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => self.input_char(c),
            (_, KeyCode::Enter) => {
                if self.active_field == Field::AlwaysUse {
                    self.always_use = !self.always_use;
                    self.dirty = true;
                } else {
                    self.focus_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SettingsUpdated(settings) => {
                // Backend-confirmed values overwrite the form unless the
                // user has unsaved edits in progress.
                if !self.dirty || self.saving {
                    self.load_from_settings(settings);
                    self.dirty = false;
                    self.saving = false;
                }
            }
            Action::SaveSettingsFinished(result) => {
                self.saving = false;
                match result {
                    Ok(()) => {
                        self.dirty = false;
                        return Ok(Some(Action::Notify(Notification::success(
                            "Settings saved",
                        ))));
                    }
                    Err(message) => {
                        return Ok(Some(Action::Notify(Notification::error(format!(
                            "Save failed: {message}"
                        )))));
                    }
                }
            }
            _ => {}
        }
        Ok(None)
    }

    #[allow(clippy::too_many_lines)]
    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" WiFi Settings ")
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

        let layout = Layout::vertical([
            Constraint::Length(10), // Form
            Constraint::Min(0),
            Constraint::Length(1), // Key hints
        ])
        .split(inner);

        let passphrase_len = self.passphrase_input.chars().count();
        let passphrase_hint = if Credentials::validate_passphrase(&self.passphrase_input).is_ok() {
            Span::styled(format!("  ({passphrase_len}/63)"), theme::key_hint())
        } else {
            Span::styled(
                format!("  ({passphrase_len} — need 8-63)"),
                Style::default().fg(theme::ERROR_RED),
            )
        };

        let octet_sep = Span::styled(".", theme::key_hint());
        let base_ip_line = Line::from(vec![
            Span::styled(" Base IP     ", theme::field_label()),
            Span::styled(
                self.subnet_text(SubnetField::Octet(0)),
                self.field_style(Field::Subnet(SubnetField::Octet(0))),
            ),
            octet_sep.clone(),
            Span::styled(
                self.subnet_text(SubnetField::Octet(1)),
                self.field_style(Field::Subnet(SubnetField::Octet(1))),
            ),
            octet_sep.clone(),
            Span::styled(
                self.subnet_text(SubnetField::Octet(2)),
                self.field_style(Field::Subnet(SubnetField::Octet(2))),
            ),
            octet_sep,
            Span::styled(
                self.subnet_text(SubnetField::LastOctet),
                self.field_style(Field::Subnet(SubnetField::LastOctet)),
            ),
        ]);

        let triple = self.editor.triple();
        let lines = vec![
            Line::from(vec![
                Span::styled(" SSID        ", theme::field_label()),
                Span::styled(self.ssid_input.clone(), self.field_style(Field::Ssid)),
            ]),
            Line::from({
                let mut spans = vec![
                    Span::styled(" Passphrase  ", theme::field_label()),
                    Span::styled(
                        self.passphrase_input.clone(),
                        self.field_style(Field::Passphrase),
                    ),
                    passphrase_hint,
                ];
                if self.active_field == Field::Passphrase {
                    spans.push(Span::styled("  Ctrl+G regenerate", theme::key_hint()));
                }
                spans
            }),
            Line::from(vec![
                Span::styled(" Remember    ", theme::field_label()),
                Span::styled(
                    if self.always_use { "[x]" } else { "[ ]" },
                    self.field_style(Field::AlwaysUse),
                ),
                Span::styled(" always use these credentials", theme::key_hint()),
            ]),
            Line::from(""),
            base_ip_line,
            Line::from(vec![
                Span::styled(" DHCP start  ", theme::field_label()),
                Span::styled(
                    self.subnet_text(SubnetField::RangeStart),
                    self.field_style(Field::Subnet(SubnetField::RangeStart)),
                ),
                Span::styled(format!("  → {}", triple.dhcp_start), theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled(" DHCP end    ", theme::field_label()),
                Span::styled(
                    self.subnet_text(SubnetField::RangeEnd),
                    self.field_style(Field::Subnet(SubnetField::RangeEnd)),
                ),
                Span::styled(format!("  → {}", triple.dhcp_end), theme::key_hint()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                if self.saving {
                    " Saving\u{2026}"
                } else if self.dirty {
                    " Unsaved changes"
                } else {
                    ""
                },
                Style::default().fg(theme::AMBER),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), layout[0]);

        let hints = Line::from(vec![
            Span::styled(" Tab ", theme::key_hint_key()),
            Span::styled("next field  ", theme::key_hint()),
            Span::styled("Space ", theme::key_hint_key()),
            Span::styled("toggle  ", theme::key_hint()),
            Span::styled("Ctrl+S ", theme::key_hint_key()),
            Span::styled("save", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "wifi-settings"
    }
}
