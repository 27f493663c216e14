use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

use crate::assets::{AssetInterceptor, SqliteAssetStore};
use crate::community::feed::{FeedAction, FeedStore};
use crate::community::interactions::{LikeToggler, ResponseDeleter, ToggleStart};
use crate::community::types::TravelResponse;
use crate::community::{CommunityClient, ResponseStore};
use crate::query::{Query, QueryState};
use crate::session::SessionHandle;
use crate::ui::renderfns::{heart, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::ResponseDetailView;
use crate::ui::ensure_valid_selection;

/// The community feed: shared travel experiences with like/unlike and
/// deletion of your own posts.
pub struct FeedView {
  client: CommunityClient,
  session: SessionHandle,
  assets: AssetInterceptor<SqliteAssetStore>,
  downloads: PathBuf,

  query: Query<Vec<TravelResponse>>,
  feed: FeedStore,
  toggler: LikeToggler,
  deleter: ResponseDeleter,

  list_state: ListState,
  /// Response id awaiting delete confirmation
  confirm_delete: Option<String>,
}

impl FeedView {
  pub fn new(
    client: CommunityClient,
    session: SessionHandle,
    assets: AssetInterceptor<SqliteAssetStore>,
    downloads: PathBuf,
  ) -> Self {
    let store: Arc<dyn ResponseStore> = Arc::new(client.clone());

    // Reads and interactions go through the same store seam
    let fetch_store = store.clone();
    let mut query = Query::new(move || {
      let store = fetch_store.clone();
      async move { store.fetch_all().await.map_err(|e| e.to_string()) }
    });

    // Start fetching immediately
    query.fetch();

    Self {
      client,
      session,
      assets,
      downloads,
      query,
      feed: FeedStore::new(),
      toggler: LikeToggler::new(store.clone()),
      deleter: ResponseDeleter::new(store),
      list_state: ListState::default(),
      confirm_delete: None,
    }
  }

  fn selected_response(&self) -> Option<&TravelResponse> {
    self
      .list_state
      .selected()
      .and_then(|i| self.feed.responses().get(i))
  }

  fn toggle_selected(&mut self) -> ViewAction {
    let Some(response) = self.selected_response().cloned() else {
      return ViewAction::None;
    };

    let user = self.session.user();
    match self.toggler.toggle(&response, user.as_ref()) {
      ToggleStart::NotSignedIn => {
        ViewAction::Notice("You must be signed in to like a response".to_string())
      }
      // Rapid repeats while the round trip is in flight are dropped
      ToggleStart::AlreadyPending | ToggleStart::Dispatched(_) => ViewAction::None,
    }
  }

  fn request_delete(&mut self) -> ViewAction {
    let Some(response) = self.selected_response() else {
      return ViewAction::None;
    };

    let own = self
      .session
      .user()
      .map(|u| response.is_authored_by(&u.id))
      .unwrap_or(false);
    if !own {
      return ViewAction::Notice("You can only delete your own responses".to_string());
    }

    self.confirm_delete = Some(response.id.clone());
    ViewAction::None
  }

  fn handle_confirm_key(&mut self, key: KeyEvent, pending_id: String) -> ViewAction {
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => {
        self.confirm_delete = None;
        if let Some(response) = self.feed.get(&pending_id).cloned() {
          self.deleter.delete(&response);
        }
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
        self.confirm_delete = None;
      }
      _ => {}
    }
    ViewAction::None
  }

  fn render_feed(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.feed.len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = if let Some(e) = self.feed.last_error() {
      format!(" Community Responses (error: {}) ", truncate(e, 40))
    } else if self.query.is_loading() && !self.feed.is_loaded() {
      " Community Responses (loading...) ".to_string()
    } else {
      format!(" Community Responses ({}) ", len)
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.feed.is_empty() {
      let content = if self.query.is_loading() {
        "Loading responses..."
      } else if self.query.is_error() {
        "Failed to load responses. Press 'r' to retry."
      } else {
        "No responses yet. Use :share to post your travel experience."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let me = self.session.user();
    let items: Vec<ListItem> = self
      .feed
      .responses()
      .iter()
      .map(|response| {
        let liked_by_me = me
          .as_ref()
          .map(|u| response.is_liked_by(&u.id))
          .unwrap_or(false);
        let pending = self.toggler.is_pending(&response.id);
        let deleting = self.deleter.is_deleting(&response.id);

        let heart_style = if pending {
          Style::default().fg(Color::Yellow)
        } else if liked_by_me {
          Style::default().fg(Color::Red)
        } else {
          Style::default().fg(Color::DarkGray)
        };

        let mut spans = vec![
          Span::styled(heart(liked_by_me || pending), heart_style),
          Span::styled(
            format!(" {:<4}", response.like_count()),
            Style::default().fg(Color::White),
          ),
          Span::styled(
            format!("{:<20}", truncate(&response.user_name, 20)),
            Style::default().fg(Color::Green),
          ),
          Span::raw(format!("Travelled to {}", truncate(&response.place, 28))),
          Span::styled(
            format!("  {}", truncate(&response.location, 24)),
            Style::default().fg(Color::DarkGray),
          ),
        ];

        if !response.images.is_empty() {
          spans.push(Span::styled(
            format!("  [{} photos]", response.images.len()),
            Style::default().fg(Color::Magenta),
          ));
        }
        if deleting {
          spans.push(Span::styled(
            "  (deleting...)",
            Style::default().fg(Color::Red),
          ));
        }

        ListItem::new(Line::from(spans))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_confirm_overlay(&self, frame: &mut Frame, area: Rect) {
    if self.confirm_delete.is_none() {
      return;
    }

    let width = 46.min(area.width);
    let height = 3.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Delete ");
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let prompt = Paragraph::new("Delete your response? (y/n)")
      .alignment(Alignment::Center)
      .style(Style::default().fg(Color::White));
    frame.render_widget(prompt, inner);
  }
}

impl View for FeedView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(pending_id) = self.confirm_delete.clone() {
      return self.handle_confirm_key(key, pending_id);
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('r') => {
        self.query.refetch();
      }
      KeyCode::Char('l') | KeyCode::Char(' ') => {
        return self.toggle_selected();
      }
      KeyCode::Char('d') => {
        return self.request_delete();
      }
      KeyCode::Enter => {
        if let Some(response) = self.selected_response().cloned() {
          return ViewAction::Push(Box::new(ResponseDetailView::new(
            response,
            self.client.clone(),
            self.assets.clone(),
            self.downloads.clone(),
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_feed(frame, area);
    self.render_confirm_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Community".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if self.query.poll() {
      match self.query.state() {
        QueryState::Success(responses) => {
          self.feed.apply(FeedAction::Loaded(responses.clone()));
        }
        QueryState::Error(e) => {
          self.feed.apply(FeedAction::LoadFailed(e.clone()));
        }
        _ => {}
      }
    }

    for outcome in self.toggler.drain() {
      self.feed.apply(FeedAction::LikeSettled(outcome));
    }
    for outcome in self.deleter.drain() {
      self.feed.apply(FeedAction::DeleteSettled(outcome));
    }

    ViewAction::None
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("l", "like"),
      Shortcut::new("d", "delete"),
      Shortcut::new("r", "refresh"),
      Shortcut::new(":", "command"),
    ]
  }
}
