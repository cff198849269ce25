use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::llm::{LlmResult, ProviderResponse};

/// Application events
#[derive(Debug)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),

    /// Pasted text
    Paste(String),

    /// Terminal resize event
    Resize,

    /// Periodic tick event
    Tick,

    /// The outstanding chat request finished
    Completion(LlmResult<ProviderResponse>),
}

/// Event handler for managing input events
///
/// Terminal input is read on a dedicated thread so the async side never
/// blocks; background tasks report back through [`EventHandler::sender`].
pub struct EventHandler {
    /// Event receiver channel
    receiver: mpsc::UnboundedReceiver<Event>,

    /// Event sender channel
    sender: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new() -> Self {
        Self::with_tick_interval(Duration::from_millis(100))
    }

    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let input_sender = sender.clone();

        std::thread::spawn(move || loop {
            let event = match crossterm::event::poll(tick_interval) {
                Ok(true) => match crossterm::event::read() {
                    Ok(event) => match convert_crossterm_event(event) {
                        Some(event) => event,
                        None => continue,
                    },
                    Err(e) => {
                        debug!("Terminal input closed: {}", e);
                        break;
                    }
                },
                Ok(false) => Event::Tick,
                Err(e) => {
                    debug!("Terminal polling failed: {}", e);
                    break;
                }
            };

            if input_sender.send(event).is_err() {
                break;
            }
        });

        Self { receiver, sender }
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Get a clone of the sender
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert crossterm events to application events
fn convert_crossterm_event(event: CrosstermEvent) -> Option<Event> {
    match event {
        // Windows reports both press and release
        CrosstermEvent::Key(key_event) if key_event.kind == KeyEventKind::Release => None,
        CrosstermEvent::Key(key_event) => Some(Event::Key(key_event)),
        CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
        CrosstermEvent::Resize(_, _) => Some(Event::Resize),
        CrosstermEvent::Mouse(_) | CrosstermEvent::FocusGained | CrosstermEvent::FocusLost => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    #[test]
    fn test_key_releases_are_dropped() {
        let press = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let release = KeyEvent {
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
            ..press
        };

        assert!(matches!(
            convert_crossterm_event(CrosstermEvent::Key(press)),
            Some(Event::Key(_))
        ));
        assert!(convert_crossterm_event(CrosstermEvent::Key(release)).is_none());
        assert!(convert_crossterm_event(CrosstermEvent::FocusLost).is_none());
    }
}
