//! WiFi signal strength bars — ▂▄▆█ with color thresholds.

use ratatui::style::Style;
use ratatui::text::Span;

use muon_core::SignalQuality;

use crate::theme;

/// Returns a styled `Span` with signal bars based on dBm value.
///
/// | Bars    | Quality   | Color         |
/// |---------|-----------|---------------|
/// | `▂▄▆█` | excellent | Success Green |
/// | `▂▄▆ ` | good      | Aqua          |
/// | `▂▄  ` | fair      | Amber         |
/// | `▂   ` | weak      | Error Red     |
/// | `····` | unknown   | Border Gray   |
pub fn signal_span(dbm: Option<i32>) -> Span<'static> {
    let (bars, color) = match SignalQuality::from_dbm(dbm) {
        SignalQuality::Excellent => ("▂▄▆█", theme::SUCCESS_GREEN),
        SignalQuality::Good => ("▂▄▆ ", theme::AQUA),
        SignalQuality::Fair => ("▂▄  ", theme::AMBER),
        SignalQuality::Weak => ("▂   ", theme::ERROR_RED),
        SignalQuality::Unknown => ("····", theme::BORDER_GRAY),
    };

    Span::styled(bars, Style::default().fg(color))
}
