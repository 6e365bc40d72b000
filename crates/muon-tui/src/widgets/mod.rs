//! Shared TUI widgets.

pub mod signal_bars;
