use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// Actions that a view can request in response to user input or an
/// async completion observed in `tick`
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Show a transient message in the footer
  Notice(String),
  /// Pop and show a transient message (e.g. after a form submits)
  PopWithNotice(String),
}

/// Trait for view behavior
///
/// Views handle their own input and return actions for the App to
/// execute. This creates a clean delegation chain:
/// App → View → Components
///
/// Views that load data asynchronously use Query<T> (or the feed
/// interaction trackers) internally and poll them in tick().
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to let views poll async work; may return an
  /// action (e.g. pop after a successful submit)
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// Whether this view consumes plain character input (forms). When
  /// true, App passes ':' through instead of opening command mode.
  fn wants_text_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  /// Override this to provide view-specific shortcuts
  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new(":", "command"), Shortcut::new("q", "back")]
  }
}
