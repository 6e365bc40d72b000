//! Banned devices screen.
//!
//! The list is fetched on entry (the app fires [`Action::RequestBanList`]
//! when switching here) and a row is removed only once the backend has
//! confirmed the unban; failures leave the list as-is.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::theme;

pub struct BannedScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    macs: Vec<String>,
    loaded: bool,
    table_state: TableState,
}

impl BannedScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            macs: Vec::new(),
            loaded: false,
            table_state: TableState::default(),
        }
    }

    fn select_next(&mut self) {
        if self.macs.is_empty() {
            return;
        }
        let next = match self.table_state.selected() {
            Some(i) if i + 1 < self.macs.len() => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.table_state.select(Some(next));
    }

    fn select_prev(&mut self) {
        if self.macs.is_empty() {
            return;
        }
        let prev = match self.table_state.selected() {
            Some(0) | None => self.macs.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(prev));
    }

    fn selected_mac(&self) -> Option<&String> {
        self.table_state.selected().and_then(|i| self.macs.get(i))
    }

    fn clamp_selection(&mut self) {
        match self.table_state.selected() {
            Some(_) if self.macs.is_empty() => self.table_state.select(None),
            Some(i) if i >= self.macs.len() => self.table_state.select(Some(self.macs.len() - 1)),
            _ => {}
        }
    }
}

impl Component for BannedScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Char('r') => return Ok(Some(Action::RequestBanList)),
            KeyCode::Enter | KeyCode::Char('u') => {
                if let Some(mac) = self.selected_mac() {
                    return Ok(Some(Action::ShowConfirm(ConfirmAction::UnbanDevice {
                        mac: mac.clone(),
                    })));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::BanListLoaded(macs) => {
                self.macs.clone_from(macs);
                self.loaded = true;
                self.clamp_selection();
            }
            Action::UnbanAccepted(mac) => {
                self.macs.retain(|m| m != mac);
                self.clamp_selection();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Banned Devices ({}) ", self.macs.len()))
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

        let layout = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(inner);

        if self.macs.is_empty() {
            let message = if self.loaded {
                "No banned devices"
            } else {
                "Loading ban list\u{2026}"
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(message, theme::key_hint()))).centered(),
                layout[0],
            );
        } else {
            let rows: Vec<Row> = self
                .macs
                .iter()
                .map(|mac| Row::new(vec![mac.clone()]).style(theme::table_row()))
                .collect();
            let table = Table::new(rows, [Constraint::Min(17)])
                .header(Row::new(vec!["MAC address"]).style(theme::table_header()))
                .row_highlight_style(theme::table_selected())
                .highlight_symbol("▸ ");
            let mut state = self.table_state.clone();
            frame.render_stateful_widget(table, layout[0], &mut state);
        }

        let hints = Line::from(vec![
            Span::styled(" ↑/↓ ", theme::key_hint_key()),
            Span::styled("select  ", theme::key_hint()),
            Span::styled("u ", theme::key_hint_key()),
            Span::styled("unban  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("refresh", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[1]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "banned"
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use crossterm::event::KeyModifiers;

    use super::*;

    fn screen_with(macs: &[&str]) -> BannedScreen {
        let mut screen = BannedScreen::new();
        let loaded = Action::BanListLoaded(macs.iter().map(ToString::to_string).collect());
        screen.update(&loaded).unwrap();
        screen
    }

    #[test]
    fn unban_key_only_asks_for_confirmation() {
        let mut screen = screen_with(&["AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]);
        screen.select_next();

        let action = screen
            .handle_key_event(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::NONE))
            .unwrap();
        match action {
            Some(Action::ShowConfirm(ConfirmAction::UnbanDevice { mac })) => {
                assert_eq!(mac, "AA:BB:CC:DD:EE:FF");
            }
            other => panic!("expected unban confirmation, got {other:?}"),
        }
        // The row stays until the backend confirms the unban.
        assert_eq!(screen.macs.len(), 2);
    }

    #[test]
    fn confirmed_unban_removes_exactly_that_row() {
        let mut screen = screen_with(&["AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]);

        screen
            .update(&Action::UnbanAccepted("AA:BB:CC:DD:EE:FF".into()))
            .unwrap();
        assert_eq!(screen.macs, vec!["11:22:33:44:55:66".to_string()]);

        // An unban the backend rejected never reaches UnbanAccepted, so
        // any other action leaves the survivors untouched.
        screen.update(&Action::Tick).unwrap();
        assert_eq!(screen.macs, vec!["11:22:33:44:55:66".to_string()]);
    }
}
