use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tracing::error;

use crate::planner::{build_prompt, format_plan, PlannerClient, TripRequest};
use crate::query::{Query, QueryState};
use crate::ui::components::TextInput;
use crate::ui::view::{Shortcut, View, ViewAction};

/// Message shown instead of a plan when the generation call fails.
const GENERATION_FAILED: &str = "Error: Failed to generate travel plan. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Destination,
  Start,
  End,
  Activity,
}

impl Field {
  fn next(self) -> Self {
    match self {
      Field::Destination => Field::Start,
      Field::Start => Field::End,
      Field::End => Field::Activity,
      Field::Activity => Field::Destination,
    }
  }

  fn prev(self) -> Self {
    match self {
      Field::Destination => Field::Activity,
      Field::Start => Field::Destination,
      Field::End => Field::Start,
      Field::Activity => Field::End,
    }
  }
}

/// Trip planner form plus the generated plan.
pub struct PlannerView {
  planner: PlannerClient,

  destination: TextInput,
  start_date: TextInput,
  end_date: TextInput,
  activity: TextInput,
  activities: Vec<String>,
  focus: Field,

  plan: Option<Query<String>>,
  scroll: u16,
}

impl PlannerView {
  pub fn new(planner: PlannerClient) -> Self {
    Self {
      planner,
      destination: TextInput::new(),
      start_date: TextInput::new(),
      end_date: TextInput::new(),
      activity: TextInput::new(),
      activities: Vec::new(),
      focus: Field::Destination,
      plan: None,
      scroll: 0,
    }
  }

  fn focused_input(&mut self) -> &mut TextInput {
    match self.focus {
      Field::Destination => &mut self.destination,
      Field::Start => &mut self.start_date,
      Field::End => &mut self.end_date,
      Field::Activity => &mut self.activity,
    }
  }

  fn add_activity(&mut self) {
    let activity = self.activity.value().trim().to_string();
    if !activity.is_empty() {
      self.activities.push(activity);
      self.activity.clear();
    }
  }

  fn request(&self) -> TripRequest {
    TripRequest {
      destination: self.destination.value().to_string(),
      start_date: self.start_date.value().to_string(),
      end_date: self.end_date.value().to_string(),
      activities: self.activities.clone(),
    }
  }

  fn generate(&mut self) -> ViewAction {
    if self.plan.as_ref().map(|q| q.is_loading()).unwrap_or(false) {
      return ViewAction::None;
    }

    let request = self.request();
    if !request.is_complete() {
      return ViewAction::Notice("Destination and both dates are required".to_string());
    }

    let prompt = build_prompt(&request);
    let planner = self.planner.clone();

    let mut query = Query::new(move || {
      let planner = planner.clone();
      let prompt = prompt.clone();
      async move {
        // One shot: the error is logged and replaced by the fixed
        // user-facing message, never retried
        planner.generate(&prompt).await.map_err(|e| {
          error!("plan generation failed: {}", e);
          GENERATION_FAILED.to_string()
        })
      }
    });

    query.fetch();
    self.plan = Some(query);
    self.scroll = 0;
    ViewAction::None
  }

  fn render_form(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Trip Planner ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
      self
        .destination
        .render_line("Destination:", self.focus == Field::Destination),
      self
        .start_date
        .render_line("Start date:", self.focus == Field::Start),
      self
        .end_date
        .render_line("End date:", self.focus == Field::End),
      self
        .activity
        .render_line("Add activity:", self.focus == Field::Activity),
      Line::default(),
      Line::from(Span::styled(
        "Activities:",
        Style::default().fg(Color::DarkGray),
      )),
    ];

    if self.activities.is_empty() {
      lines.push(Line::from(Span::styled(
        "  (none)",
        Style::default().fg(Color::DarkGray),
      )));
    } else {
      for activity in &self.activities {
        lines.push(Line::from(format!("  - {}", activity)));
      }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
      "Tab: next field   Ctrl-g: generate   Ctrl-x: drop activity",
      Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn render_plan(&self, frame: &mut Frame, area: Rect) {
    let title = match self.plan.as_ref().map(|q| q.state()) {
      Some(QueryState::Loading) => " Plan (generating...) ",
      Some(QueryState::Error(_)) => " Plan (failed) ",
      _ => " Plan ",
    };

    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = match self.plan.as_ref().map(|q| q.state()) {
      None => Paragraph::new("Fill in the trip details and press Ctrl-g.")
        .style(Style::default().fg(Color::DarkGray)),
      Some(QueryState::Loading) => Paragraph::new("Generating your travel plan...")
        .style(Style::default().fg(Color::DarkGray)),
      Some(QueryState::Error(message)) => {
        Paragraph::new(message.clone()).style(Style::default().fg(Color::Red))
      }
      Some(QueryState::Success(text)) => {
        let mut lines: Vec<Line> = Vec::new();
        for block in format_plan(text) {
          if block.emphasis {
            lines.push(Line::from(Span::styled(
              block.text,
              Style::default().bold(),
            )));
          } else {
            lines.push(Line::from(block.text));
          }
          lines.push(Line::default());
        }
        Paragraph::new(lines)
      }
      Some(QueryState::Idle) => Paragraph::new(""),
    };

    frame.render_widget(
      paragraph.wrap(Wrap { trim: true }).scroll((self.scroll, 0)),
      inner,
    );
  }
}

impl View for PlannerView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Tab => {
        self.focus = self.focus.next();
      }
      KeyCode::BackTab => {
        self.focus = self.focus.prev();
      }
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Enter => {
        if self.focus == Field::Activity {
          self.add_activity();
        } else {
          self.focus = self.focus.next();
        }
      }
      KeyCode::Char('g') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        return self.generate();
      }
      KeyCode::Char('x') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.activities.pop();
      }
      KeyCode::PageUp => {
        self.scroll = self.scroll.saturating_sub(5);
      }
      KeyCode::PageDown => {
        self.scroll = self.scroll.saturating_add(5);
      }
      _ => {
        self.focused_input().handle_key(key);
      }
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Length(46), Constraint::Min(20)])
      .split(area);

    self.render_form(frame, chunks[0]);
    self.render_plan(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Trip Planner".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if let Some(plan) = &mut self.plan {
      plan.poll();
    }
    ViewAction::None
  }

  fn wants_text_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("^g", "generate"),
      Shortcut::new("Tab", "next field"),
      Shortcut::new("Esc", "back"),
    ]
  }
}
