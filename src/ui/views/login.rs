use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::{info, warn};

use crate::community::types::Session;
use crate::community::CommunityClient;
use crate::query::{Query, QueryState};
use crate::session::{self, SessionHandle};
use crate::ui::components::TextInput;
use crate::ui::view::{Shortcut, View, ViewAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Email,
  Password,
}

/// Sign-in form.
pub struct LoginView {
  client: CommunityClient,
  session: SessionHandle,

  email: TextInput,
  password: TextInput,
  focus: Field,

  login: Option<Query<Session>>,
}

impl LoginView {
  pub fn new(client: CommunityClient, session: SessionHandle) -> Self {
    Self {
      client,
      session,
      email: TextInput::new(),
      password: TextInput::masked(),
      focus: Field::Email,
      login: None,
    }
  }

  fn submit(&mut self) -> ViewAction {
    if self.login.as_ref().map(|q| q.is_loading()).unwrap_or(false) {
      return ViewAction::None;
    }

    if self.email.is_empty() || self.password.is_empty() {
      return ViewAction::Notice("Email and password are required".to_string());
    }

    let client = self.client.clone();
    let email = self.email.value().to_string();
    let password = self.password.value().to_string();

    let mut query = Query::new(move || {
      let client = client.clone();
      let email = email.clone();
      let password = password.clone();
      async move { client.login(&email, &password).await.map_err(|e| e.to_string()) }
    });

    query.fetch();
    self.login = Some(query);
    ViewAction::None
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Tab | KeyCode::BackTab => {
        self.focus = match self.focus {
          Field::Email => Field::Password,
          Field::Password => Field::Email,
        };
      }
      KeyCode::Enter => {
        return match self.focus {
          Field::Email => {
            self.focus = Field::Password;
            ViewAction::None
          }
          Field::Password => self.submit(),
        };
      }
      _ => {
        let input = match self.focus {
          Field::Email => &mut self.email,
          Field::Password => &mut self.password,
        };
        input.handle_key(key);
      }
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let width = 56.min(area.width);
    let height = 8.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let form_area = Rect::new(x, y, width, height);

    let block = Block::default()
      .title(" Sign in ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(form_area);
    frame.render_widget(block, form_area);

    let status = match self.login.as_ref().map(|q| q.state()) {
      Some(QueryState::Loading) => Line::from(Span::styled(
        "Signing in...",
        Style::default().fg(Color::DarkGray),
      )),
      Some(QueryState::Error(e)) => {
        Line::from(Span::styled(e.clone(), Style::default().fg(Color::Red)))
      }
      _ => Line::from(Span::styled(
        "Enter submits, Esc goes back",
        Style::default().fg(Color::DarkGray),
      )),
    };

    let lines = vec![
      self.email.render_line("Email:", self.focus == Field::Email),
      self
        .password
        .render_line("Password:", self.focus == Field::Password),
      Line::default(),
      status,
    ];

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    "Sign in".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    let Some(login) = &mut self.login else {
      return ViewAction::None;
    };

    if login.poll() {
      if let QueryState::Success(new_session) = login.state() {
        let new_session = new_session.clone();

        // Persisting the token is best-effort; a failure only costs
        // the restored session on next start
        if let Err(e) = session::save_token(&new_session.token) {
          warn!("failed to persist session token: {}", e);
        }

        info!(user = %new_session.user.name, "signed in");
        let name = new_session.user.name.clone();
        self.session.sign_in(new_session);
        return ViewAction::PopWithNotice(format!("Signed in as {}", name));
      }
    }

    ViewAction::None
  }

  fn wants_text_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("Enter", "submit"), Shortcut::new("Esc", "back")]
  }
}
