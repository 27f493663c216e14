use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tracing::{info, warn};

use crate::assets::{AssetInterceptor, InstallOutcome, SqliteAssetStore};
use crate::commands::{self, Command};
use crate::community::types::Session;
use crate::community::CommunityClient;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::planner::PlannerClient;
use crate::session::{self, SessionHandle};
use crate::ui;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::{CacheStatusView, FeedView, LoginView, PlannerView, ShareView};

/// How long a footer notice stays visible
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Main application state
pub struct App {
  config: Config,
  client: CommunityClient,
  planner: PlannerClient,
  assets: AssetInterceptor<SqliteAssetStore>,
  session: SessionHandle,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Transient footer message and when it appeared
  notice: Option<(String, Instant)>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub async fn new(config: Config) -> Result<Self> {
    let session = SessionHandle::new();
    let client = CommunityClient::new(&config, session.clone())?;
    let planner = PlannerClient::new(&config)?;

    let store = Arc::new(SqliteAssetStore::open_default()?);
    let assets = AssetInterceptor::new(
      store,
      &config.assets.version,
      config.assets.manifest.clone(),
      config.assets.skip_waiting,
    );

    // Both run in the background; the feed renders while they finish
    Self::restore_session(&client, &session);
    Self::warm_asset_cache(&assets, &client);

    let root: Box<dyn View> = Box::new(FeedView::new(
      client.clone(),
      session.clone(),
      assets.clone(),
      config.downloads_dir(),
    ));

    Ok(Self {
      config,
      client,
      planner,
      assets,
      session,
      view_stack: vec![root],
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      notice: None,
      should_quit: false,
    })
  }

  /// Validate a persisted token against the account endpoint, signing
  /// the user in when it still holds (the on-load session check).
  fn restore_session(client: &CommunityClient, session: &SessionHandle) {
    let Some(token) = session::load_saved_token() else {
      return;
    };

    let client = client.clone();
    let session = session.clone();
    tokio::spawn(async move {
      match client.current_user(&token).await {
        Ok(user) => {
          info!(user = %user.name, "restored session");
          session.sign_in(Session { token, user });
        }
        Err(e) => {
          warn!("saved session token rejected: {}", e);
          if let Err(e) = session::forget_token() {
            warn!("failed to remove stale token: {}", e);
          }
        }
      }
    });
  }

  /// Install/activate the shell asset generation in the background.
  /// Failures stay in the log; the app itself never notices them.
  fn warm_asset_cache(assets: &AssetInterceptor<SqliteAssetStore>, client: &CommunityClient) {
    let assets = assets.clone();
    let client = client.clone();
    tokio::spawn(async move {
      let fetch = |url: String| {
        let client = client.clone();
        async move { client.fetch_asset(&url).await }
      };

      match assets.install(fetch).await {
        Ok(InstallOutcome::Installed { assets: count }) => {
          info!(generation = assets.generation(), count, "asset cache installed");
        }
        Ok(InstallOutcome::AlreadyInstalled) => match assets.activate() {
          Ok(purged) if purged > 0 => {
            info!(generation = assets.generation(), purged, "purged old asset generations");
          }
          Ok(_) => {}
          Err(e) => warn!("asset cache activation failed: {}", e),
        },
        Err(e) => warn!("asset cache install failed: {}", e),
      }
    });
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize => {} // Redraw happens on the next loop pass
      Event::Tick => self.tick(),
    }
  }

  fn tick(&mut self) {
    // Expire the footer notice
    if let Some((_, shown_at)) = &self.notice {
      if shown_at.elapsed() > NOTICE_TTL {
        self.notice = None;
      }
    }

    // Every view gets to poll its async work (a like can settle while
    // a detail view is on top); only the top view's action is honored
    let top = self.view_stack.len().saturating_sub(1);
    let mut top_action = ViewAction::None;
    for (i, view) in self.view_stack.iter_mut().enumerate() {
      let action = view.tick();
      if i == top {
        top_action = action;
      }
    }
    self.apply_action(top_action);
  }

  fn handle_key(&mut self, key: KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let in_form = self
      .view_stack
      .last()
      .map(|v| v.wants_text_input())
      .unwrap_or(false);

    if key.code == KeyCode::Char(':') && !in_form {
      self.mode = Mode::Command;
      self.command_input.clear();
      self.selected_suggestion = 0;
      return;
    }

    let action = self
      .view_stack
      .last_mut()
      .map(|view| view.handle_key(key))
      .unwrap_or(ViewAction::None);
    self.apply_action(action);
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        // Navigate autocomplete suggestions
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        // Navigate autocomplete suggestions backwards
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0; // Reset selection on input change
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0; // Reset selection on input change
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    // Get the command to execute - either from selected suggestion or direct input
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      self.command_input.trim().to_lowercase()
    };

    match cmd.as_str() {
      "community" => {
        self.view_stack.clear();
        self.view_stack.push(Box::new(FeedView::new(
          self.client.clone(),
          self.session.clone(),
          self.assets.clone(),
          self.config.downloads_dir(),
        )));
      }
      "planner" => {
        self.view_stack.clear();
        self
          .view_stack
          .push(Box::new(PlannerView::new(self.planner.clone())));
      }
      "share" => {
        if self.session.is_signed_in() {
          self
            .view_stack
            .push(Box::new(ShareView::new(self.client.clone())));
        } else {
          self.set_notice("You must be signed in to share an experience");
        }
      }
      "login" => match self.session.user() {
        Some(user) => self.set_notice(format!("Already signed in as {}", user.name)),
        None => {
          self.view_stack.push(Box::new(LoginView::new(
            self.client.clone(),
            self.session.clone(),
          )));
        }
      },
      "logout" => self.logout(),
      "cache" => {
        self
          .view_stack
          .push(Box::new(CacheStatusView::new(self.assets.clone())));
      }
      "quit" => {
        self.should_quit = true;
      }
      _ => {
        // Unknown command
      }
    }
    self.command_input.clear();
  }

  fn logout(&mut self) {
    if !self.session.is_signed_in() {
      self.set_notice("Not signed in");
      return;
    }

    // Server first, then the local session, like the web client
    let client = self.client.clone();
    let session = self.session.clone();
    tokio::spawn(async move {
      if let Err(e) = client.logout().await {
        warn!("sign out request failed: {}", e);
      }
      session.sign_out();
      if let Err(e) = session::forget_token() {
        warn!("failed to remove session token: {}", e);
      }
    });

    self.set_notice("Signed out");
  }

  fn apply_action(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => self.pop_view(),
      ViewAction::Notice(message) => self.set_notice(message),
      ViewAction::PopWithNotice(message) => {
        self.pop_view();
        self.set_notice(message);
      }
    }
  }

  fn pop_view(&mut self) {
    if self.view_stack.len() > 1 {
      self.view_stack.pop();
    } else {
      self.should_quit = true;
    }
  }

  fn set_notice(&mut self, message: impl Into<String>) {
    self.notice = Some((message.into(), Instant::now()));
  }

  // Accessors for UI rendering

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }

  pub fn community_url(&self) -> &str {
    &self.config.community.url
  }

  pub fn title(&self) -> Option<&str> {
    self.config.title.as_deref()
  }

  pub fn user_name(&self) -> Option<String> {
    self.session.user().map(|u| u.name)
  }

  pub fn notice(&self) -> Option<&str> {
    self.notice.as_ref().map(|(message, _)| message.as_str())
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }

  pub fn current_shortcuts(&self) -> Vec<Shortcut> {
    self
      .view_stack
      .last()
      .map(|v| v.shortcuts())
      .unwrap_or_default()
  }

  pub fn render_current_view(&mut self, frame: &mut Frame, area: Rect) {
    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, area);
    }
  }
}
