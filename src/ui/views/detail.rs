use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use tracing::error;

use crate::assets::{AssetInterceptor, SqliteAssetStore};
use crate::community::types::TravelResponse;
use crate::community::CommunityClient;
use crate::query::{Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::heart;
use crate::ui::view::{Shortcut, View, ViewAction};

/// Full view of a single travel response, with attachment saving routed
/// through the asset interceptor.
pub struct ResponseDetailView {
  response: TravelResponse,
  client: CommunityClient,
  assets: AssetInterceptor<SqliteAssetStore>,
  downloads: PathBuf,

  attachment_state: ListState,
  /// In-flight or settled attachment save; holds the saved path
  save: Option<Query<String>>,
}

impl ResponseDetailView {
  pub fn new(
    response: TravelResponse,
    client: CommunityClient,
    assets: AssetInterceptor<SqliteAssetStore>,
    downloads: PathBuf,
  ) -> Self {
    Self {
      response,
      client,
      assets,
      downloads,
      attachment_state: ListState::default(),
      save: None,
    }
  }

  fn save_selected_attachment(&mut self) {
    if self.save.as_ref().map(|q| q.is_loading()).unwrap_or(false) {
      return;
    }

    let Some(file_id) = self
      .attachment_state
      .selected()
      .and_then(|i| self.response.images.get(i))
      .cloned()
    else {
      return;
    };

    let assets = self.assets.clone();
    let client = self.client.clone();
    let downloads = self.downloads.clone();

    let mut query = Query::new(move || {
      let assets = assets.clone();
      let client = client.clone();
      let downloads = downloads.clone();
      let file_id = file_id.clone();

      async move {
        let path = format!("/v1/files/{}/view", file_id);
        // All asset traffic goes through the interceptor; pinned URLs
        // come from the cache, everything else hits the network
        let served = assets
          .serve(&path, |url| {
            let client = client.clone();
            async move { client.fetch_asset(&url).await }
          })
          .await
          .map_err(|e| e.to_string())?;

        tracing::debug!(
          file = %file_id,
          source = ?served.source,
          content_type = ?served.content_type,
          "attachment fetched"
        );

        let target = downloads.join(format!("wayfarer-{}", file_id));
        tokio::fs::write(&target, &served.body)
          .await
          .map_err(|e| e.to_string())?;

        Ok(target.display().to_string())
      }
    });

    query.fetch();
    self.save = Some(query);
  }

  fn render_detail(&mut self, frame: &mut Frame, area: Rect) {
    let title = format!(" {} ", self.response.place);

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let attachments_height = if self.response.images.is_empty() {
      0
    } else {
      (self.response.images.len() as u16 + 2).min(6)
    };

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3),                  // Header
        Constraint::Length(1),                  // Separator
        Constraint::Min(1),                     // Content
        Constraint::Length(attachments_height), // Attachments
      ])
      .split(inner);

    let header = vec![
      Line::from(vec![
        Span::styled("By: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          self.response.user_name.clone(),
          Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
          format!("{} {}", heart(true), self.response.like_count()),
          Style::default().fg(Color::Red),
        ),
      ]),
      Line::from(vec![
        Span::styled("Travelled to: ", Style::default().fg(Color::DarkGray)),
        Span::raw(self.response.place.clone()),
        Span::raw("  "),
        Span::styled(
          self.response.location.clone(),
          Style::default().fg(Color::DarkGray),
        ),
      ]),
    ];
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let sep = Paragraph::new("─".repeat(chunks[1].width as usize))
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, chunks[1]);

    let content = if self.response.content.is_empty() {
      "No writeup"
    } else {
      &self.response.content
    };
    let content_para = Paragraph::new(content).wrap(Wrap { trim: true });
    frame.render_widget(content_para, chunks[2]);

    if !self.response.images.is_empty() {
      self.render_attachments(frame, chunks[3]);
    }
  }

  fn render_attachments(&mut self, frame: &mut Frame, area: Rect) {
    ensure_valid_selection(&mut self.attachment_state, self.response.images.len());

    let title = match self.save.as_ref().map(|q| q.state()) {
      Some(QueryState::Loading) => " Attachments (saving...) ".to_string(),
      Some(QueryState::Success(path)) => format!(" Attachments (saved to {}) ", path),
      Some(QueryState::Error(_)) => " Attachments (save failed) ".to_string(),
      _ => " Attachments ".to_string(),
    };

    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Magenta));

    let items: Vec<ListItem> = self
      .response
      .images
      .iter()
      .map(|file_id| ListItem::new(Line::from(file_id.clone())))
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray))
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.attachment_state);
  }
}

impl View for ResponseDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.attachment_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.attachment_state.select_previous();
      }
      KeyCode::Char('s') => {
        self.save_selected_attachment();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_detail(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.response.place.clone()
  }

  fn tick(&mut self) -> ViewAction {
    if let Some(save) = &mut self.save {
      if save.poll() {
        match save.state() {
          QueryState::Success(path) => {
            return ViewAction::Notice(format!("Saved attachment to {}", path));
          }
          QueryState::Error(e) => {
            // Fetch failures surface only as the control going idle
            error!(response = %self.response.id, "attachment save failed: {}", e);
          }
          _ => {}
        }
      }
    }
    ViewAction::None
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("s", "save attachment"), Shortcut::new("q", "back")]
  }
}
