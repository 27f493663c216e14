use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::assets::{AssetInterceptor, CacheStatus, SqliteAssetStore};
use crate::ui::renderfns::format_bytes;
use crate::ui::view::{Shortcut, View, ViewAction};

/// Read-only view of the offline asset cache: stored generations, which
/// one is live, and how much they hold.
pub struct CacheStatusView {
  assets: AssetInterceptor<SqliteAssetStore>,
  status: Option<CacheStatus>,
  error: Option<String>,
}

impl CacheStatusView {
  pub fn new(assets: AssetInterceptor<SqliteAssetStore>) -> Self {
    let mut view = Self {
      assets,
      status: None,
      error: None,
    };
    view.reload();
    view
  }

  fn reload(&mut self) {
    match self.assets.status() {
      Ok(status) => {
        self.status = Some(status);
        self.error = None;
      }
      Err(e) => {
        self.error = Some(e.to_string());
      }
    }
  }
}

impl View for CacheStatusView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.reload();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Offline Asset Cache ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(error) = &self.error {
      let paragraph =
        Paragraph::new(format!("Failed to read cache: {}", error)).style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, inner);
      return;
    }

    let Some(status) = &self.status else {
      return;
    };

    let mut lines = vec![
      Line::from(vec![
        Span::styled("Current generation: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          status.current_generation.clone(),
          Style::default().fg(Color::Cyan),
        ),
      ]),
      Line::default(),
    ];

    if status.generations.is_empty() {
      lines.push(Line::from(Span::styled(
        "No generations installed yet. The shell manifest is fetched in the background on start.",
        Style::default().fg(Color::DarkGray),
      )));
    }

    for generation in &status.generations {
      let marker = if generation.activated { "●" } else { "○" };
      let marker_style = if generation.name == status.current_generation {
        Style::default().fg(Color::Green)
      } else {
        Style::default().fg(Color::DarkGray)
      };

      lines.push(Line::from(vec![
        Span::styled(format!("{} ", marker), marker_style),
        Span::styled(
          format!("{:<28}", generation.name),
          Style::default().fg(Color::White),
        ),
        Span::raw(format!(
          "{:>4} assets  {:>10}  ",
          generation.entry_count,
          format_bytes(generation.total_bytes)
        )),
        Span::styled(
          format!(
            "installed {}",
            generation.installed_at.format("%Y-%m-%d %H:%M")
          ),
          Style::default().fg(Color::DarkGray),
        ),
      ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    "Cache".to_string()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("r", "reload"), Shortcut::new("q", "back")]
  }
}
