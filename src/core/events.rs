//! Unified event handling system

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::telemetry::{ApiError, PollBatch, UserSummary};

/// All possible events in the system
#[derive(Debug, Clone)]
pub enum Event {
    // Input events
    Key(KeyEvent),
    Resize(u16, u16),

    // Render tick
    Tick,

    // Poll cycle finished for the view with this id
    PollCompleted {
        view_id: uuid::Uuid,
        result: Result<PollBatch, ApiError>,
    },

    // User selection list fetched
    UsersLoaded(Result<Vec<UserSummary>, ApiError>),

    // Remote command round trips
    CommandSent {
        view_id: uuid::Uuid,
        result: Result<(), ApiError>,
    },
    CommandOutput {
        view_id: uuid::Uuid,
        result: Result<String, ApiError>,
    },

    // Lifecycle
    Quit,
}

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> (Self, mpsc::UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }

    /// Start terminal input and the render tick
    pub fn spawn_sources(event_tx: mpsc::UnboundedSender<Event>) {
        tokio::spawn(Self::terminal_events(event_tx.clone()));

        // 100ms is plenty for data that changes every few seconds
        tokio::spawn(Self::tick_events(event_tx, Duration::from_millis(100)));
    }

    async fn terminal_events(tx: mpsc::UnboundedSender<Event>) {
        use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};
        use futures::StreamExt;

        let mut reader = event::EventStream::new();
        while let Some(event_result) = reader.next().await {
            let event = match event_result {
                Ok(CrosstermEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    Event::Key(key)
                }
                Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "terminal event stream failed");
                    let _ = tx.send(Event::Quit);
                    break;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    }

    async fn tick_events(tx: mpsc::UnboundedSender<Event>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if tx.send(Event::Tick).is_err() {
                break;
            }
        }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Key binding helper
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.code == self.key && event.modifiers == self.modifiers
    }
}

/// Standard key bindings
pub struct KeyBindings;

impl KeyBindings {
    pub fn quit() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('q'))
    }

    pub fn quit_alt() -> KeyBinding {
        KeyBinding::ctrl(KeyCode::Char('c'))
    }

    pub fn help() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('?'))
    }

    pub fn theme() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('t'))
    }

    pub fn all_users() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('a'))
    }

    pub fn escape() -> KeyBinding {
        KeyBinding::new(KeyCode::Esc)
    }

    pub fn enter() -> KeyBinding {
        KeyBinding::new(KeyCode::Enter)
    }

    pub fn tab() -> KeyBinding {
        KeyBinding::new(KeyCode::Tab)
    }

    pub fn backtab() -> KeyBinding {
        KeyBinding {
            key: KeyCode::BackTab,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn up() -> KeyBinding {
        KeyBinding::new(KeyCode::Up)
    }

    pub fn down() -> KeyBinding {
        KeyBinding::new(KeyCode::Down)
    }

    pub fn vim_up() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('k'))
    }

    pub fn vim_down() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('j'))
    }

    pub fn refresh() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('r'))
    }

    pub fn refresh_output() -> KeyBinding {
        KeyBinding::ctrl(KeyCode::Char('r'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_binding_needs_the_modifier() {
        let plain = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);
        let ctrl = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);

        assert!(KeyBindings::refresh().matches(&plain));
        assert!(!KeyBindings::refresh().matches(&ctrl));
        assert!(KeyBindings::refresh_output().matches(&ctrl));
    }

    #[test]
    fn backtab_carries_shift() {
        let key = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert!(KeyBindings::backtab().matches(&key));
    }
}
