//! Fixed colour theme, built once at compile time.

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(0xF1, 0xC0, 0x69);
pub const SOFT: Color = Color::Rgb(0xF8, 0xE3, 0xBD);
pub const PANEL_BG: Color = Color::Rgb(0x1F, 0x1F, 0x1F);

pub const TITLE: Style = Style::new()
    .fg(ACCENT)
    .bg(PANEL_BG)
    .add_modifier(Modifier::BOLD);
pub const SUBTITLE: Style = Style::new().fg(SOFT);
pub const BORDER: Style = Style::new().fg(ACCENT);
pub const STATUS: Style = Style::new()
    .fg(Color::Rgb(0x7D, 0xCE, 0x82))
    .add_modifier(Modifier::BOLD);
pub const ERROR: Style = Style::new()
    .fg(Color::Rgb(0xFF, 0x6B, 0x6B))
    .add_modifier(Modifier::BOLD);
pub const WARNING: Style = Style::new()
    .fg(Color::Rgb(0xFF, 0xB8, 0x6C))
    .add_modifier(Modifier::BOLD);
pub const INFO: Style = Style::new().fg(Color::Rgb(0x8B, 0xE9, 0xFD));
pub const SELECTED: Style = Style::new().fg(ACCENT).add_modifier(Modifier::BOLD);
pub const DIM: Style = Style::new().fg(Color::DarkGray);
