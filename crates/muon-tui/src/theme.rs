//! Deck Slate palette and semantic styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const STEAM_BLUE: Color = Color::Rgb(26, 159, 255); // #1a9fff
pub const AQUA: Color = Color::Rgb(102, 224, 255); // #66e0ff
pub const AMBER: Color = Color::Rgb(255, 196, 77); // #ffc44d
pub const SUCCESS_GREEN: Color = Color::Rgb(92, 214, 127); // #5cd67f
pub const ERROR_RED: Color = Color::Rgb(255, 95, 95); // #ff5f5f

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(205, 209, 219); // #cdd1db
pub const BORDER_GRAY: Color = Color::Rgb(86, 98, 125); // #56627d
pub const BG_HIGHLIGHT: Color = Color::Rgb(35, 43, 59); // #232b3b
pub const BG_DARK: Color = Color::Rgb(22, 27, 38); // #161b26

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(AQUA).add_modifier(Modifier::BOLD)
}

/// Border for a focused panel.
pub fn border_focused() -> Style {
    Style::default().fg(STEAM_BLUE)
}

/// Border for an unfocused panel.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Table header row.
pub fn table_header() -> Style {
    Style::default()
        .fg(AQUA)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Normal table row text.
pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Selected / highlighted table row.
pub fn table_selected() -> Style {
    Style::default()
        .fg(STEAM_BLUE)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Active tab in the tab bar.
pub fn tab_active() -> Style {
    Style::default().fg(STEAM_BLUE).add_modifier(Modifier::BOLD)
}

/// Inactive tab in the tab bar.
pub fn tab_inactive() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(AQUA).add_modifier(Modifier::BOLD)
}

/// Form field label.
pub fn field_label() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Form field value with input focus.
pub fn field_active() -> Style {
    Style::default()
        .fg(STEAM_BLUE)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Form field value without focus.
pub fn field_inactive() -> Style {
    Style::default().fg(DIM_WHITE)
}
