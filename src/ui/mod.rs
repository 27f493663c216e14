pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::{App, Mode};
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer / notices
    ])
    .split(frame.area());

  renderfns::draw_header(
    frame,
    chunks[0],
    app.community_url(),
    app.title(),
    app.user_name().as_deref(),
    &app.current_shortcuts(),
  );

  app.render_current_view(frame, chunks[1]);

  renderfns::draw_footer(frame, chunks[2], &app.view_breadcrumb(), app.notice());

  // Command overlay sits above the content area
  if *app.mode() == Mode::Command {
    components::draw_command_overlay(
      frame,
      chunks[1],
      app.command_input(),
      &app.autocomplete_suggestions(),
      app.selected_suggestion(),
    );
  }
}

/// Clamp a list selection to the current item count.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}
