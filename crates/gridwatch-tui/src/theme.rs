//! Wallboard palette and semantic styling.

use ratatui::style::{Color, Modifier, Style};

// ── Core palette ──────────────────────────────────────────────────────

pub const CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const RED: Color = Color::Rgb(255, 99, 99); // #ff6363
pub const YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff

// ── Semantic styles ───────────────────────────────────────────────────

/// Header/title text.
pub fn title_style() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}

/// Regular tile border.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Border of the keyboard-selected tile.
pub fn border_selected() -> Style {
    Style::default().fg(PURPLE)
}

/// Border of a tile in warn state.
pub fn border_warn() -> Style {
    Style::default().fg(RED)
}

/// Border of a drag source or candidate drop target.
pub fn border_drag() -> Style {
    Style::default().fg(YELLOW)
}

/// Secondary text (empty cells, padding, hints).
pub fn dim() -> Style {
    Style::default().fg(DIM_WHITE).add_modifier(Modifier::DIM)
}

/// Receive-direction accents (rates, sparklines).
pub fn rx_style() -> Style {
    Style::default().fg(CYAN)
}

/// Transmit-direction accents.
pub fn tx_style() -> Style {
    Style::default().fg(CORAL)
}

/// Stale-data marker.
pub fn stale_style() -> Style {
    Style::default().fg(YELLOW)
}

/// Error toast / missing-device marker.
pub fn error_style() -> Style {
    Style::default().fg(RED).add_modifier(Modifier::BOLD)
}

/// Info toast.
pub fn info_style() -> Style {
    Style::default().fg(GREEN)
}
