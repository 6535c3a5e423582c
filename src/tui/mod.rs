//! Interactive menu session.
//!
//! The event loop owns the terminal. Operations run on a worker thread and
//! report back through a one-shot channel, except those that need the
//! terminal themselves: for those the screen is handed back to the tool for
//! the duration of the run.

pub mod app;
pub mod event;
pub mod style;
pub mod ui;

use std::io::{stdout, Stdout};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::types::OperationRequest;
use crate::util::command::CommandRunner;
use crate::workflow::Workflow;

use self::app::{App, Dispatch};
use self::event::{Event, EventHandler};

const TICK_RATE: Duration = Duration::from_millis(120);

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Runs the menu until the user quits.
pub fn run<R: CommandRunner + 'static>(workflow: Arc<Workflow<R>>) -> Result<()> {
    let mut terminal = enter()?;
    let mut app = App::new(workflow.settings().backup_pool.clone());
    let mut events = EventHandler::new(TICK_RATE);

    let result = run_app(&mut terminal, &mut app, &mut events, &workflow);

    leave(&mut terminal)?;
    result
}

fn enter() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn leave(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app<R: CommandRunner + 'static>(
    terminal: &mut Term,
    app: &mut App,
    events: &mut EventHandler,
    workflow: &Arc<Workflow<R>>,
) -> Result<()> {
    while !app.quitting {
        terminal.draw(|frame| ui::draw(frame, app))?;

        match events.next()? {
            Event::Key(key) => match app.handle_key(key) {
                Dispatch::Start(request) => {
                    if request.kind().needs_terminal() {
                        run_in_foreground(terminal, app, workflow, request)?;
                    } else {
                        spawn(events, workflow, request);
                    }
                }
                Dispatch::Quit | Dispatch::None => {}
            },
            Event::Tick => app.tick(),
            Event::Resize(_, _) => {}
            Event::Completed(result) => app.complete(result),
        }
    }
    Ok(())
}

fn spawn<R: CommandRunner + 'static>(
    events: &mut EventHandler,
    workflow: &Arc<Workflow<R>>,
    request: OperationRequest,
) {
    let kind = request.kind();
    let (tx, rx) = mpsc::channel();
    let workflow = Arc::clone(workflow);
    thread::spawn(move || {
        let result = workflow.execute(request);
        // Receiver gone means the session already quit.
        let _ = tx.send(result);
    });
    events.watch(kind, rx);
}

/// Leaves the alternate screen so the tool can prompt on the terminal.
fn run_in_foreground<R: CommandRunner>(
    terminal: &mut Term,
    app: &mut App,
    workflow: &Workflow<R>,
    request: OperationRequest,
) -> Result<()> {
    leave(terminal)?;
    println!("Running {}...", request.kind());
    let result = workflow.execute(request);
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()?;
    app.complete(result);
    Ok(())
}
