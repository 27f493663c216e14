use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::community::types::{ResponseDraft, TravelResponse};
use crate::community::CommunityClient;
use crate::query::{Query, QueryState};
use crate::ui::components::TextInput;
use crate::ui::view::{Shortcut, View, ViewAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Place,
  Location,
  Content,
}

impl Field {
  fn next(self) -> Self {
    match self {
      Field::Place => Field::Location,
      Field::Location => Field::Content,
      Field::Content => Field::Place,
    }
  }
}

/// Form for sharing a travel experience.
pub struct ShareView {
  client: CommunityClient,

  place: TextInput,
  location: TextInput,
  content: TextInput,
  focus: Field,

  submit: Option<Query<TravelResponse>>,
}

impl ShareView {
  pub fn new(client: CommunityClient) -> Self {
    Self {
      client,
      place: TextInput::new(),
      location: TextInput::new(),
      content: TextInput::new(),
      focus: Field::Place,
      submit: None,
    }
  }

  fn submit(&mut self) -> ViewAction {
    if self.submit.as_ref().map(|q| q.is_loading()).unwrap_or(false) {
      return ViewAction::None;
    }

    if self.place.is_empty() || self.location.is_empty() {
      return ViewAction::Notice("Place and location are required".to_string());
    }

    let client = self.client.clone();
    let draft = ResponseDraft {
      place: self.place.value().trim().to_string(),
      location: self.location.value().trim().to_string(),
      content: self.content.value().trim().to_string(),
    };

    let mut query = Query::new(move || {
      let client = client.clone();
      let draft = draft.clone();
      async move { client.create_response(&draft).await.map_err(|e| e.to_string()) }
    });

    query.fetch();
    self.submit = Some(query);
    ViewAction::None
  }

  fn focused_input(&mut self) -> &mut TextInput {
    match self.focus {
      Field::Place => &mut self.place,
      Field::Location => &mut self.location,
      Field::Content => &mut self.content,
    }
  }
}

impl View for ShareView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Tab => {
        self.focus = self.focus.next();
      }
      KeyCode::Enter => {
        if self.focus == Field::Content {
          return self.submit();
        }
        self.focus = self.focus.next();
      }
      KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        return self.submit();
      }
      _ => {
        self.focused_input().handle_key(key);
      }
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let width = 70.min(area.width);
    let height = 10.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let form_area = Rect::new(x, y, width, height);

    let block = Block::default()
      .title(" Share your Travel Experience ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(form_area);
    frame.render_widget(block, form_area);

    let status = match self.submit.as_ref().map(|q| q.state()) {
      Some(QueryState::Loading) => Line::from(Span::styled(
        "Sharing...",
        Style::default().fg(Color::DarkGray),
      )),
      Some(QueryState::Error(e)) => {
        Line::from(Span::styled(e.clone(), Style::default().fg(Color::Red)))
      }
      _ => Line::from(Span::styled(
        "Ctrl-s submits, Esc goes back. Photos are attached from the web app.",
        Style::default().fg(Color::DarkGray),
      )),
    };

    let lines = vec![
      self.place.render_line("Place:", self.focus == Field::Place),
      self
        .location
        .render_line("Location:", self.focus == Field::Location),
      self
        .content
        .render_line("Experience:", self.focus == Field::Content),
      Line::default(),
      status,
    ];

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    "Share".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    let Some(submit) = &mut self.submit else {
      return ViewAction::None;
    };

    if submit.poll() {
      if let QueryState::Success(response) = submit.state() {
        return ViewAction::PopWithNotice(format!("Shared your {} experience", response.place));
      }
    }

    ViewAction::None
  }

  fn wants_text_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("^s", "share"), Shortcut::new("Esc", "back")]
  }
}
