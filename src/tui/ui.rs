//! Rendering. Pure function of [`App`].

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::tui::app::{App, Screen, MENU, SPINNER_FRAMES};
use crate::tui::style;
use crate::types::{LineKind, Outcome, TranscriptLine};

pub(crate) const HELP_TEXT: &str = "\
🗄️  ZFS Backup Management Tool

DESCRIPTION:
  A TUI for managing ZFS backups from the source pool to the backup pool.

OPERATIONS:

  📦 Backup ZFS (incremental)
     Performs an incremental backup using syncoid. Creates a timestamped
     snapshot, syncs to the external backup pool, and prunes old snapshots
     while keeping monthly archives. You will be prompted for the encryption
     password.

  🔥 Force Backup ZFS (destructive)
     Forces a complete backup by deleting previous snapshots on the backup
     disk. Use this when local and backup are out of sync. You will be
     prompted for the encryption password.

  🔧 Prepare Backup Device
     Creates an encrypted ZFS pool on a new external drive. This will
     erase all data on the given device and create the backup pool
     with AES-256-GCM encryption. zpool asks for the new passphrase itself.

  🔌 Unmount Backup Disk
     Safely exports the backup pool and powers off the USB drive.
     Always use this before unplugging the backup drive.

REQUIREMENTS:
  - syncoid installed (from sanoid package)
  - ZFS filesystem with the source pool
  - External drive for the backup pool
  - Root privileges (sudo) OR ZFS delegation configured
  - Encryption password for the backup pool

KEYBOARD SHORTCUTS:
  ↑/↓      Navigate menu
  Enter    Select option
  y/n      Confirm/Cancel
  Esc      Go back
  q        Quit application
  Ctrl+C   Force quit";

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    draw_menu(frame, area, app);

    match app.screen {
        Screen::Menu => {}
        Screen::Confirm => draw_confirm(frame, area, app),
        Screen::DeviceInput => draw_device_input(frame, area, app),
        Screen::SecretInput => draw_secret_input(frame, area, app),
        Screen::Running => draw_running(frame, area, app),
        Screen::Result => draw_result(frame, area, app),
        Screen::Help => draw_help(frame, area, app),
    }
}

fn draw_menu(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Paragraph::new(vec![
        Line::from(Span::styled("🗄️  ZFS Backup Management Tool", style::TITLE)),
        Line::from(Span::styled(
            format!("Manage your {} backup operations", app.backup_pool),
            style::SUBTITLE,
        )),
    ]);
    frame.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = MENU
        .iter()
        .map(|entry| {
            ListItem::new(vec![
                Line::from(format!("{} {}", entry.icon, entry.title)),
                Line::from(Span::styled(format!("   {}", entry.description), style::DIM)),
            ])
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style::BORDER),
        )
        .highlight_style(style::SELECTED)
        .highlight_symbol("▸ ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, chunks[1], &mut state);

    frame.render_widget(
        Paragraph::new(Span::styled("Press 'q' or Ctrl+C to quit", style::INFO)),
        chunks[2],
    );
}

/// Dialog box centred in `area`, returning its inner region.
fn modal(frame: &mut Frame, area: Rect, width: u16, height: u16, title: &str) -> Rect {
    let dialog = centered_area(area, width, height);
    frame.render_widget(Clear, dialog);
    let block = Block::default()
        .title(Span::styled(title.to_string(), style::TITLE))
        .borders(Borders::ALL)
        .border_style(style::BORDER);
    let inner = block.inner(dialog);
    frame.render_widget(block, dialog);
    inner
}

pub fn centered_area(area: Rect, max_width: u16, max_height: u16) -> Rect {
    let width = area.width.min(max_width);
    let height = area.height.min(max_height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn draw_confirm(frame: &mut Frame, area: Rect, app: &App) {
    let inner = modal(frame, area, 70, 10, " ⚠️  Confirmation Required ");
    let mut lines: Vec<Line> = app
        .confirm_message
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), style::WARNING)))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press 'y' to confirm, 'n' to cancel",
        style::INFO,
    )));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_device_input(frame: &mut Frame, area: Rect, app: &App) {
    let inner = modal(frame, area, 64, 10, " 🔧 Prepare Backup Device ");
    let lines = vec![
        Line::from(Span::styled(
            "Enter the device path to use for backup:",
            style::INFO,
        )),
        Line::from(""),
        Line::from(format!("> {}█", app.device_input)),
        Line::from(""),
        Line::from(Span::styled("Example: /dev/sda", style::SUBTITLE)),
        Line::from(Span::styled(
            "Press Enter to continue, Esc to cancel",
            style::INFO,
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_secret_input(frame: &mut Frame, area: Rect, app: &App) {
    let inner = modal(frame, area, 64, 9, " 🔐 Encryption Password ");
    let masked = "•".repeat(app.secret_input.len());
    let lines = vec![
        Line::from(Span::styled(
            format!("Enter the encryption password for {}:", app.backup_pool),
            style::INFO,
        )),
        Line::from(""),
        Line::from(format!("> {}█", masked)),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to continue, Esc to cancel",
            style::INFO,
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_running(frame: &mut Frame, area: Rect, app: &App) {
    let inner = modal(frame, area, 60, 7, " ⚙️  Working... ");
    let label = app.running.map(|k| k.as_str()).unwrap_or("operation");
    let lines = vec![
        Line::from(vec![
            Span::styled(SPINNER_FRAMES[app.spinner % SPINNER_FRAMES.len()], style::STATUS),
            Span::raw(" "),
            Span::raw(label),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Please wait while the operation completes...",
            style::INFO,
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn transcript_line(line: &TranscriptLine) -> Line<'_> {
    match line.kind {
        LineKind::Step => Line::from(Span::styled(format!("→ {}", line.text), style::INFO)),
        LineKind::Info => Line::from(line.text.as_str()),
        LineKind::Warning => {
            Line::from(Span::styled(format!("⚠ {}", line.text), style::WARNING))
        }
        LineKind::Detail => Line::from(Span::styled(format!("    {}", line.text), style::DIM)),
        LineKind::Done => Line::from(Span::styled(format!("✓ {}", line.text), style::STATUS)),
    }
}

fn draw_result(frame: &mut Frame, area: Rect, app: &App) {
    let width = area.width.saturating_sub(4);
    let height = area.height.saturating_sub(2);
    let Some(result) = app.last_result.as_ref() else {
        return;
    };
    let title = if result.is_success() {
        " ✅ Operation Completed "
    } else {
        " ❌ Operation Failed "
    };
    let inner = modal(frame, area, width, height, title);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let mut lines: Vec<Line> = result.transcript.lines().iter().map(transcript_line).collect();
    if let Outcome::Failure(message) = &result.outcome {
        lines.push(Line::from(""));
        for text in message.lines() {
            lines.push(Line::from(Span::styled(text, style::ERROR)));
        }
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((app.scroll, 0)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            "Press Enter or Esc to return to menu",
            style::INFO,
        )),
        chunks[1],
    );
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let width = area.width.saturating_sub(4).min(80);
    let height = area.height.saturating_sub(2);
    let inner = modal(frame, area, width, height, " Help ");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(
        Paragraph::new(HELP_TEXT).scroll((app.scroll, 0)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            "Press Enter or Esc to return to menu",
            style::INFO,
        )),
        chunks[1],
    );
}
