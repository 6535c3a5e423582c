//! Interactive session state.
//!
//! `App` only mutates itself. Starting an operation or quitting is reported
//! back to the event loop as a [`Dispatch`], which owns every side effect.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::ui::HELP_TEXT;
use crate::types::{
    OperationKind, OperationRequest, OperationResult, Outcome, PendingRequest, Secret,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Confirm,
    DeviceInput,
    SecretInput,
    Running,
    Result,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Run(OperationKind),
    Help,
    Exit,
}

#[derive(Debug, Clone, Copy)]
pub struct MenuEntry {
    pub action: MenuAction,
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const MENU: [MenuEntry; 6] = [
    MenuEntry {
        action: MenuAction::Run(OperationKind::Backup),
        icon: "📦",
        title: "Backup ZFS (incremental)",
        description: "Snapshot the source dataset and send it incrementally to the backup pool",
    },
    MenuEntry {
        action: MenuAction::Run(OperationKind::ForceBackup),
        icon: "🔥",
        title: "Force Backup ZFS (destructive)",
        description: "Force backup; deletes conflicting snapshots on the backup disk",
    },
    MenuEntry {
        action: MenuAction::Run(OperationKind::Prepare),
        icon: "🔧",
        title: "Prepare Backup Device",
        description: "Create an encrypted ZFS pool on a new backup device",
    },
    MenuEntry {
        action: MenuAction::Run(OperationKind::Unmount),
        icon: "🔌",
        title: "Unmount Backup Disk",
        description: "Export the backup pool and power off the drive",
    },
    MenuEntry {
        action: MenuAction::Help,
        icon: "❓",
        title: "Help",
        description: "Show help information",
    },
    MenuEntry {
        action: MenuAction::Exit,
        icon: "❌",
        title: "Exit",
        description: "Exit the application",
    },
];

pub const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const DEVICE_CHAR_LIMIT: usize = 50;
const SECRET_CHAR_LIMIT: usize = 256;
const PAGE: u16 = 10;

/// What the event loop should do after a key press.
#[derive(Debug)]
pub enum Dispatch {
    None,
    Start(OperationRequest),
    Quit,
}

pub struct App {
    pub screen: Screen,
    pub selected: usize,
    pub pending: Option<PendingRequest>,
    pub confirm_message: String,
    pub device_input: String,
    pub secret_input: Secret,
    pub running: Option<OperationKind>,
    pub last_result: Option<OperationResult>,
    pub spinner: usize,
    pub scroll: u16,
    pub backup_pool: String,
    pub quitting: bool,
}

impl App {
    pub fn new(backup_pool: impl Into<String>) -> Self {
        Self {
            screen: Screen::Menu,
            selected: 0,
            pending: None,
            confirm_message: String::new(),
            device_input: String::new(),
            secret_input: Secret::default(),
            running: None,
            last_result: None,
            spinner: 0,
            scroll: 0,
            backup_pool: backup_pool.into(),
            quitting: false,
        }
    }

    pub fn selected_entry(&self) -> &MenuEntry {
        &MENU[self.selected]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Dispatch {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.quit();
        }
        match self.screen {
            Screen::Menu => self.on_menu_key(key.code),
            Screen::Confirm => self.on_confirm_key(key.code),
            Screen::DeviceInput => self.on_device_key(key.code),
            Screen::SecretInput => self.on_secret_key(key.code),
            Screen::Running => Dispatch::None,
            Screen::Result | Screen::Help => self.on_dismiss_key(key.code),
        }
    }

    /// Advances the busy indicator.
    pub fn tick(&mut self) {
        if self.screen == Screen::Running {
            self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn complete(&mut self, result: OperationResult) {
        self.running = None;
        self.scroll = 0;
        self.last_result = Some(result);
        self.screen = Screen::Result;
    }

    fn quit(&mut self) -> Dispatch {
        self.quitting = true;
        self.secret_input = Secret::default();
        Dispatch::Quit
    }

    fn back_to_menu(&mut self) -> Dispatch {
        self.pending = None;
        self.confirm_message.clear();
        self.device_input.clear();
        self.secret_input = Secret::default();
        self.scroll = 0;
        self.screen = Screen::Menu;
        Dispatch::None
    }

    fn on_menu_key(&mut self, code: KeyCode) -> Dispatch {
        match code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.checked_sub(1).unwrap_or(MENU.len() - 1);
                Dispatch::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1) % MENU.len();
                Dispatch::None
            }
            KeyCode::Enter => self.select(self.selected_entry().action),
            _ => Dispatch::None,
        }
    }

    fn select(&mut self, action: MenuAction) -> Dispatch {
        match action {
            MenuAction::Run(kind) => {
                self.pending = Some(PendingRequest::new(kind));
                match kind {
                    OperationKind::Backup => {
                        self.secret_input = Secret::default();
                        self.screen = Screen::SecretInput;
                        Dispatch::None
                    }
                    OperationKind::ForceBackup => {
                        self.confirm_message = "⚠️  This will delete all previous snapshots on the backup disk.\nAre you sure you want to continue?".to_string();
                        self.screen = Screen::Confirm;
                        Dispatch::None
                    }
                    OperationKind::Prepare => {
                        self.device_input.clear();
                        self.screen = Screen::DeviceInput;
                        Dispatch::None
                    }
                    OperationKind::Unmount => self.start(None),
                }
            }
            MenuAction::Help => {
                self.scroll = 0;
                self.screen = Screen::Help;
                Dispatch::None
            }
            MenuAction::Exit => self.quit(),
        }
    }

    fn on_confirm_key(&mut self, code: KeyCode) -> Dispatch {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.pending.as_ref().map(|p| p.kind) {
                    Some(OperationKind::ForceBackup) => {
                        self.secret_input = Secret::default();
                        self.screen = Screen::SecretInput;
                        Dispatch::None
                    }
                    Some(OperationKind::Prepare) => self.start(None),
                    _ => self.back_to_menu(),
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.back_to_menu(),
            _ => Dispatch::None,
        }
    }

    fn on_device_key(&mut self, code: KeyCode) -> Dispatch {
        match code {
            KeyCode::Enter => {
                let device = self.device_input.trim().to_string();
                if device.is_empty() {
                    return Dispatch::None;
                }
                let Some(pending) = self.pending.take() else {
                    return self.back_to_menu();
                };
                self.confirm_message = format!(
                    "⚠️  WARNING: You are about to erase all data on {}.\nThis action is irreversible!\nAre you absolutely sure?",
                    device
                );
                self.pending = Some(pending.with_device(device));
                self.screen = Screen::Confirm;
                Dispatch::None
            }
            KeyCode::Esc => self.back_to_menu(),
            KeyCode::Backspace => {
                self.device_input.pop();
                Dispatch::None
            }
            KeyCode::Char(c) => {
                if self.device_input.chars().count() < DEVICE_CHAR_LIMIT {
                    self.device_input.push(c);
                }
                Dispatch::None
            }
            _ => Dispatch::None,
        }
    }

    fn on_secret_key(&mut self, code: KeyCode) -> Dispatch {
        match code {
            KeyCode::Enter => {
                if self.secret_input.is_empty() {
                    return Dispatch::None;
                }
                let secret = self.secret_input.take();
                self.start(Some(secret))
            }
            KeyCode::Esc => self.back_to_menu(),
            KeyCode::Backspace => {
                self.secret_input.pop();
                Dispatch::None
            }
            KeyCode::Char(c) => {
                if self.secret_input.len() < SECRET_CHAR_LIMIT {
                    self.secret_input.push(c);
                }
                Dispatch::None
            }
            _ => Dispatch::None,
        }
    }

    fn on_dismiss_key(&mut self, code: KeyCode) -> Dispatch {
        match code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => self.back_to_menu(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = self.scroll.saturating_sub(1);
                Dispatch::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_by(1);
                Dispatch::None
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(PAGE);
                Dispatch::None
            }
            KeyCode::PageDown => {
                self.scroll_by(PAGE);
                Dispatch::None
            }
            _ => Dispatch::None,
        }
    }

    /// Scrolls down without passing the last line of the pane content.
    fn scroll_by(&mut self, lines: u16) {
        let last = u16::try_from(self.content_lines().saturating_sub(1)).unwrap_or(u16::MAX);
        self.scroll = self.scroll.saturating_add(lines).min(last);
    }

    /// Lines shown in the Result or Help pane, before wrapping.
    pub fn content_lines(&self) -> usize {
        match self.screen {
            Screen::Help => HELP_TEXT.lines().count(),
            Screen::Result => self.last_result.as_ref().map_or(0, |result| {
                let failure = match &result.outcome {
                    Outcome::Failure(message) => 1 + message.lines().count(),
                    Outcome::Success => 0,
                };
                result.transcript.lines().len() + failure
            }),
            _ => 0,
        }
    }

    /// Finalizes the pending request and enters the running state.
    fn start(&mut self, secret: Option<Secret>) -> Dispatch {
        let Some(pending) = self.pending.take() else {
            return self.back_to_menu();
        };
        let Some(request) = pending.finalize(secret) else {
            return self.back_to_menu();
        };
        self.running = Some(request.kind());
        self.spinner = 0;
        self.confirm_message.clear();
        self.device_input.clear();
        self.screen = Screen::Running;
        Dispatch::Start(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Outcome, Transcript};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl_c() -> KeyEvent {
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(matches!(app.handle_key(key(KeyCode::Char(c))), Dispatch::None));
        }
    }

    fn select(app: &mut App, index: usize) -> Dispatch {
        while app.selected != index {
            app.handle_key(key(KeyCode::Down));
        }
        app.handle_key(key(KeyCode::Enter))
    }

    fn result(kind: OperationKind) -> OperationResult {
        OperationResult {
            kind,
            transcript: Transcript::new(),
            outcome: Outcome::Failure("zpool failed".to_string()),
        }
    }

    #[test]
    fn menu_entries_carry_actions() {
        assert_eq!(MENU[0].action, MenuAction::Run(OperationKind::Backup));
        assert_eq!(MENU[3].action, MenuAction::Run(OperationKind::Unmount));
        assert_eq!(MENU[5].action, MenuAction::Exit);
    }

    #[test]
    fn menu_navigation_wraps() {
        let mut app = App::new("NIXBACKUPS");
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected, MENU.len() - 1);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn backup_asks_for_secret_then_starts() {
        let mut app = App::new("NIXBACKUPS");
        assert!(matches!(select(&mut app, 0), Dispatch::None));
        assert_eq!(app.screen, Screen::SecretInput);

        // empty submit does not advance
        assert!(matches!(app.handle_key(key(KeyCode::Enter)), Dispatch::None));
        assert_eq!(app.screen, Screen::SecretInput);

        type_text(&mut app, "hunter2");
        match app.handle_key(key(KeyCode::Enter)) {
            Dispatch::Start(OperationRequest::Backup { secret }) => {
                assert_eq!(secret.expose(), "hunter2")
            }
            other => panic!("unexpected dispatch {:?}", other),
        }
        assert_eq!(app.screen, Screen::Running);
        assert!(app.secret_input.is_empty());
        assert_eq!(app.running, Some(OperationKind::Backup));
    }

    #[test]
    fn secret_is_empty_after_completion() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 0);
        type_text(&mut app, "pw");
        let _ = app.handle_key(key(KeyCode::Enter));
        app.complete(result(OperationKind::Backup));
        assert_eq!(app.screen, Screen::Result);
        assert!(app.secret_input.is_empty());
        assert!(app.running.is_none());
    }

    #[test]
    fn force_backup_confirms_first() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 1);
        assert_eq!(app.screen, Screen::Confirm);
        assert!(app.confirm_message.contains("delete all previous snapshots"));
        app.handle_key(key(KeyCode::Char('y')));
        assert_eq!(app.screen, Screen::SecretInput);
        type_text(&mut app, "pw");
        assert!(matches!(
            app.handle_key(key(KeyCode::Enter)),
            Dispatch::Start(OperationRequest::ForceBackup { .. })
        ));
    }

    #[test]
    fn declining_force_backup_returns_to_menu() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 1);
        assert!(matches!(app.handle_key(key(KeyCode::Char('n'))), Dispatch::None));
        assert_eq!(app.screen, Screen::Menu);
        assert!(app.pending.is_none());
    }

    #[test]
    fn prepare_declined_never_starts() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 2);
        assert_eq!(app.screen, Screen::DeviceInput);
        // blank device is ignored
        type_text(&mut app, "  ");
        assert!(matches!(app.handle_key(key(KeyCode::Enter)), Dispatch::None));
        assert_eq!(app.screen, Screen::DeviceInput);
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Backspace));

        type_text(&mut app, "/dev/sdb");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Confirm);
        assert!(app.confirm_message.contains("erase all data on /dev/sdb"));

        assert!(matches!(app.handle_key(key(KeyCode::Esc)), Dispatch::None));
        assert_eq!(app.screen, Screen::Menu);
        assert!(app.pending.is_none());
        assert!(app.running.is_none());
    }

    #[test]
    fn prepare_confirmed_uses_entered_device() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 2);
        type_text(&mut app, "/dev/sdq");
        app.handle_key(key(KeyCode::Enter));
        match app.handle_key(key(KeyCode::Char('Y'))) {
            Dispatch::Start(OperationRequest::Prepare { device }) => assert_eq!(device, "/dev/sdq"),
            other => panic!("unexpected dispatch {:?}", other),
        }
        assert_eq!(app.screen, Screen::Running);
    }

    #[test]
    fn device_input_accepts_q() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 2);
        type_text(&mut app, "/dev/disk/by-id/usb-q");
        assert_eq!(app.device_input, "/dev/disk/by-id/usb-q");
        assert!(!app.quitting);
    }

    #[test]
    fn unmount_starts_immediately() {
        let mut app = App::new("NIXBACKUPS");
        assert!(matches!(
            select(&mut app, 3),
            Dispatch::Start(OperationRequest::Unmount)
        ));
        assert_eq!(app.screen, Screen::Running);
    }

    #[test]
    fn running_ignores_keys_except_force_quit() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 3);
        assert!(matches!(app.handle_key(key(KeyCode::Char('q'))), Dispatch::None));
        assert!(matches!(app.handle_key(key(KeyCode::Enter)), Dispatch::None));
        assert_eq!(app.screen, Screen::Running);
        app.tick();
        assert_eq!(app.spinner, 1);
        assert!(matches!(app.handle_key(ctrl_c()), Dispatch::Quit));
        assert!(app.quitting);
    }

    #[test]
    fn result_dismisses_to_menu() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 3);
        app.complete(result(OperationKind::Unmount));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.scroll, 1);
        app.handle_key(key(KeyCode::Char('q')));
        assert_eq!(app.screen, Screen::Menu);
        assert!(!app.quitting);
    }

    #[test]
    fn help_opens_at_top_after_scrolled_result() {
        let mut app = App::new("NIXBACKUPS");
        let mut transcript = Transcript::new();
        transcript.detail((1..=30).map(|n| format!("line {}\n", n)).collect::<String>());
        app.complete(OperationResult {
            kind: OperationKind::Unmount,
            transcript,
            outcome: Outcome::Success,
        });
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.scroll, 10);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.scroll, 0);
        select(&mut app, 4);
        assert_eq!(app.screen, Screen::Help);
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn scroll_stops_at_last_line() {
        let mut app = App::new("NIXBACKUPS");
        let mut transcript = Transcript::new();
        transcript.step("Unmounting the NIXBACKUPS pool");
        transcript.step("Exporting the NIXBACKUPS pool");
        app.complete(OperationResult {
            kind: OperationKind::Unmount,
            transcript,
            outcome: Outcome::Failure("failed to export pool".to_string()),
        });
        // two steps, a blank separator and one error line
        assert_eq!(app.content_lines(), 4);
        for _ in 0..5 {
            app.handle_key(key(KeyCode::PageDown));
        }
        assert_eq!(app.scroll, 3);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.scroll, 3);

        app.handle_key(key(KeyCode::Esc));
        select(&mut app, 4);
        for _ in 0..1000 {
            app.handle_key(key(KeyCode::Down));
        }
        assert_eq!(usize::from(app.scroll), HELP_TEXT.lines().count() - 1);
    }

    #[test]
    fn help_and_exit() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 4);
        assert_eq!(app.screen, Screen::Help);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Menu);
        assert!(matches!(select(&mut app, 5), Dispatch::Quit));
    }

    #[test]
    fn cancel_secret_clears_buffer() {
        let mut app = App::new("NIXBACKUPS");
        select(&mut app, 0);
        type_text(&mut app, "abc");
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Menu);
        assert!(app.secret_input.is_empty());
        assert!(app.pending.is_none());
    }

    #[test]
    fn ctrl_c_quits_from_any_screen() {
        for index in [0, 1, 2] {
            let mut app = App::new("NIXBACKUPS");
            select(&mut app, index);
            assert!(matches!(app.handle_key(ctrl_c()), Dispatch::Quit));
        }
    }
}
