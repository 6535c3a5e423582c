//! Event source for the interactive session

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};

use crate::types::{OperationKind, OperationResult, Outcome, Transcript};

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    /// Periodic tick, drives the busy spinner
    Tick,
    Resize(u16, u16),
    /// The running operation finished
    Completed(OperationResult),
}

pub struct EventHandler {
    tick_rate: Duration,
    completion: Option<(OperationKind, Receiver<OperationResult>)>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self {
            tick_rate,
            completion: None,
        }
    }

    /// Registers the one-shot channel of the operation just started.
    pub fn watch(&mut self, kind: OperationKind, completion: Receiver<OperationResult>) {
        self.completion = Some((kind, completion));
    }

    /// Next event; blocks for at most one tick.
    pub fn next(&mut self) -> std::io::Result<Event> {
        if let Some((kind, rx)) = &self.completion {
            let kind = *kind;
            match rx.try_recv() {
                Ok(result) => {
                    self.completion = None;
                    return Ok(Event::Completed(result));
                }
                // Worker died without reporting.
                Err(TryRecvError::Disconnected) => {
                    self.completion = None;
                    return Ok(Event::Completed(OperationResult {
                        kind,
                        transcript: Transcript::new(),
                        outcome: Outcome::Failure(format!("{} ended without a result", kind)),
                    }));
                }
                Err(TryRecvError::Empty) => {}
            }
        }
        if event::poll(self.tick_rate)? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    return Ok(Event::Key(key))
                }
                CrosstermEvent::Resize(w, h) => return Ok(Event::Resize(w, h)),
                _ => {}
            }
        }
        Ok(Event::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_delivered_once() {
        let mut handler = EventHandler::new(Duration::from_millis(1));
        let (tx, rx) = std::sync::mpsc::channel();
        handler.watch(OperationKind::Unmount, rx);
        tx.send(OperationResult {
            kind: OperationKind::Unmount,
            transcript: Transcript::new(),
            outcome: Outcome::Success,
        })
        .expect("send");
        match handler.next().expect("event") {
            Event::Completed(result) => assert!(result.is_success()),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(handler.completion.is_none());
    }

    #[test]
    fn dropped_worker_reports_failure() {
        let mut handler = EventHandler::new(Duration::from_millis(1));
        let (tx, rx) = std::sync::mpsc::channel::<OperationResult>();
        handler.watch(OperationKind::Backup, rx);
        drop(tx);
        match handler.next().expect("event") {
            Event::Completed(result) => assert_eq!(
                result.outcome,
                Outcome::Failure("backup ended without a result".to_string())
            ),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
