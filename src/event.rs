use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal resized, a redraw is needed
  Resize,
  /// Periodic tick for UI refresh and query polling
  Tick,
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn terminal event reader
    tokio::spawn(async move {
      loop {
        let event = if event::poll(tick_rate).unwrap_or(false) {
          match event::read() {
            // Windows delivers both press and release; only forward presses
            Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
              Some(Event::Key(key))
            }
            Ok(CrosstermEvent::Resize(_, _)) => Some(Event::Resize),
            _ => None,
          }
        } else {
          Some(Event::Tick)
        };

        if let Some(event) = event {
          if tx.send(event).is_err() {
            break;
          }
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
